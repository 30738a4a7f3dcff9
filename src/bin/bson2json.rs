//! `bson2json` — convert one BSON document file to Extended JSON.
//!
//! Usage:
//!   bson2json <input.bson> <output.json> [--canonical] [--pretty]
//!
//! Writes the converted text to the output path and prints it to stdout.

use std::path::PathBuf;

use bson2json::{convert, ConvertOptions};

const USAGE: &str = "usage: bson2json <input.bson> <output.json> [--canonical] [--pretty]";

fn main() {
    let mut options = ConvertOptions::default();
    let mut paths: Vec<PathBuf> = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--canonical" => options.canonical = true,
            "--pretty" => options.pretty = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                return;
            }
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.len() != 2 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    match convert(&paths[0], &paths[1], options) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
