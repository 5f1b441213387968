//! LightDB - A lightweight flat-file SQL query engine
//!
//! This is the main entry point for the LightDB command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use lightdb::db::{Database, DatabaseConfig};

const USAGE: &str = "Usage: lightdb database_dir input_file output_file";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut verbose = false;
    let mut persist_catalog = false;
    let mut positional = Vec::new();

    for arg in &args {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "--persist-catalog" => persist_catalog = true,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("lightdb v{}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option: {}", other);
                eprintln!("{}", USAGE);
                return ExitCode::FAILURE;
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    let [database_dir, input_file, output_file] = match <[PathBuf; 3]>::try_from(positional) {
        Ok(paths) => paths,
        Err(_) => {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    let config = DatabaseConfig::new(database_dir)
        .persist_catalog(persist_catalog)
        .verbose(verbose);

    let result = Database::open_with_config(config).and_then(|db| db.run_query_file(&input_file, &output_file));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("LightDB - A lightweight flat-file SQL query engine");
    println!();
    println!("{}", USAGE);
    println!();
    println!("Arguments:");
    println!("  database_dir         Directory holding schema.txt and data/");
    println!("  input_file           File containing one SELECT statement");
    println!("  output_file          File the result rows are written to");
    println!();
    println!("Options:");
    println!("  -v, --verbose        Enable debug logging (RUST_LOG overrides)");
    println!("  --persist-catalog    Keep catalog.json in the database directory");
    println!("  -h, --help           Show this help message");
    println!("  --version            Show version");
}
