//! IEEE 754-2008 decimal128 string conversion.
//!
//! BSON stores decimal128 in the binary integer decimal (BID) encoding,
//! little-endian. Conversion works on the whole 128-bit word with `u128`
//! arithmetic; the coefficient fits because 10^34 - 1 < 2^113.

const EXPONENT_BIAS: i32 = 6176;
const MIN_EXPONENT: i32 = -6176;
const MAX_EXPONENT: i32 = 6111;
const COEFFICIENT_BITS: u32 = 113;
const MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999_999; // 10^34 - 1

/// Renders a decimal128 value using the standard's toString notation rules.
pub fn to_string(raw: &[u8; 16]) -> String {
    let bits = u128::from_le_bytes(*raw);
    let negative = bits >> 127 == 1;
    let combination = ((bits >> 122) & 0x1f) as u8;
    if combination == 0b11110 {
        return if negative {
            "-Infinity".to_owned()
        } else {
            "Infinity".to_owned()
        };
    }
    if combination == 0b11111 {
        return "NaN".to_owned();
    }
    let (exponent, coefficient) = if combination >> 3 == 0b11 {
        // High combination form: two extra exponent bits, implicit (100)
        // prefix on the coefficient. The resulting coefficient always
        // exceeds 10^34 - 1, so it is non-canonical.
        let exponent = ((bits >> 111) & 0x3fff) as i32 - EXPONENT_BIAS;
        let coefficient = (bits & ((1 << 111) - 1)) | (0b100 << 111);
        (exponent, coefficient)
    } else {
        let exponent = ((bits >> COEFFICIENT_BITS) & 0x3fff) as i32 - EXPONENT_BIAS;
        (exponent, bits & ((1 << COEFFICIENT_BITS) - 1))
    };
    // Non-canonical coefficients represent zero.
    let coefficient = if coefficient > MAX_COEFFICIENT {
        0
    } else {
        coefficient
    };
    format_parts(negative, coefficient, exponent)
}

fn format_parts(negative: bool, coefficient: u128, exponent: i32) -> String {
    let digits = coefficient.to_string();
    let adjusted = exponent + digits.len() as i32 - 1;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if exponent > 0 || adjusted < -6 {
        // Scientific notation: d.dddE±X with the adjusted exponent.
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('E');
        if adjusted >= 0 {
            out.push('+');
        }
        out.push_str(&adjusted.to_string());
    } else if exponent == 0 {
        out.push_str(&digits);
    } else {
        let point = digits.len() as i32 + exponent;
        if point <= 0 {
            out.push_str("0.");
            for _ in 0..-point {
                out.push('0');
            }
            out.push_str(&digits);
        } else {
            out.push_str(&digits[..point as usize]);
            out.push('.');
            out.push_str(&digits[point as usize..]);
        }
    }
    out
}

/// Parses a decimal string back to BID bytes.
///
/// Accepts the notation produced by [`to_string`] plus an optional leading
/// `+` and a lowercase exponent marker. Returns `None` for strings that need
/// rounding (more than 34 significant digits) or exceed the exponent range.
pub fn from_string(s: &str) -> Option<[u8; 16]> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let sign_bit = if negative { 1u128 << 127 } else { 0 };
    match rest {
        "Infinity" | "Inf" => return Some(((0b11110u128 << 122) | sign_bit).to_le_bytes()),
        "NaN" => return Some((0b11111u128 << 122).to_le_bytes()),
        _ => {}
    }
    let (mantissa, exp_part) = match rest.find(['E', 'e']) {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    let exponent: i32 = match exp_part {
        Some(e) => e.parse().ok()?,
        None => 0,
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], &mantissa[i + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let digits: String = [int_part, frac_part].concat();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Checked: the exponent string may parse to i32::MIN.
    let exponent = exponent.checked_sub(frac_part.len() as i32)?;
    let significant = digits.trim_start_matches('0');
    if significant.len() > 34 {
        return None;
    }
    let coefficient: u128 = if significant.is_empty() {
        0
    } else {
        significant.parse().ok()?
    };
    if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        return None;
    }
    let bits =
        sign_bit | (((exponent + EXPONENT_BIAS) as u128) << COEFFICIENT_BITS) | coefficient;
    Some(bits.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(negative: bool, coefficient: u128, exponent: i32) -> [u8; 16] {
        let sign = if negative { 1u128 << 127 } else { 0 };
        (sign | (((exponent + EXPONENT_BIAS) as u128) << COEFFICIENT_BITS) | coefficient)
            .to_le_bytes()
    }

    #[test]
    fn renders_integers() {
        assert_eq!(to_string(&bid(false, 1, 0)), "1");
        assert_eq!(to_string(&bid(true, 1, 0)), "-1");
        assert_eq!(to_string(&bid(false, 0, 0)), "0");
        assert_eq!(to_string(&bid(true, 0, 0)), "-0");
        assert_eq!(to_string(&bid(false, 2_148_000, 0)), "2148000");
    }

    #[test]
    fn renders_fractions() {
        assert_eq!(to_string(&bid(false, 1, -1)), "0.1");
        assert_eq!(to_string(&bid(false, 123_456, -8)), "0.00123456");
        assert_eq!(to_string(&bid(false, 10, -1)), "1.0");
        assert_eq!(to_string(&bid(true, 25, -2)), "-0.25");
    }

    #[test]
    fn renders_scientific_notation() {
        assert_eq!(to_string(&bid(false, 1, 3)), "1E+3");
        assert_eq!(to_string(&bid(false, 12345, 2)), "1.2345E+6");
        assert_eq!(to_string(&bid(false, 1, -8)), "1E-8");
    }

    #[test]
    fn renders_specials() {
        assert_eq!(to_string(&(0b11110u128 << 122).to_le_bytes()), "Infinity");
        assert_eq!(
            to_string(&((0b11110u128 << 122) | (1 << 127)).to_le_bytes()),
            "-Infinity"
        );
        assert_eq!(to_string(&(0b11111u128 << 122).to_le_bytes()), "NaN");
    }

    #[test]
    fn treats_non_canonical_coefficient_as_zero() {
        let bits = (6176u128 << COEFFICIENT_BITS) | (MAX_COEFFICIENT + 1);
        assert_eq!(to_string(&bits.to_le_bytes()), "0");
    }

    #[test]
    fn string_round_trips() {
        for s in [
            "1",
            "-1",
            "0",
            "0.1",
            "1.0",
            "-0.25",
            "1E+3",
            "1.2345E+6",
            "1E-8",
            "Infinity",
            "-Infinity",
            "NaN",
        ] {
            let raw = from_string(s).unwrap();
            assert_eq!(to_string(&raw), s, "round trip of {s}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(from_string(""), None);
        assert_eq!(from_string("abc"), None);
        assert_eq!(from_string("1.2.3"), None);
        assert_eq!(from_string("1E"), None);
    }

    #[test]
    fn rejects_exponent_out_of_range_without_overflowing() {
        assert_eq!(from_string("1.5E-2147483648"), None);
        assert_eq!(from_string("1.5E2147483647"), None);
        assert_eq!(from_string("1E-6177"), None);
        assert_eq!(from_string("1E+6112"), None);
    }
}
