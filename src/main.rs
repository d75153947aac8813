//! Gridcalc - a formula grid with transactional recalculation

mod command;
mod config;
mod error;

use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context;
use gridcalc_core::{Sheet, SheetConfig};
use tracing_subscriber::EnvFilter;

use command::{Console, execute, parse_command, parse_edit};

fn print_usage() {
    eprintln!("Usage: gridcalc [OPTIONS]");
    eprintln!();
    eprintln!("Reads commands from stdin unless edits are given with -e.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e, --edit <LABEL=TEXT>   Apply an edit and print the result (can be repeated)");
    eprintln!("  --rows <N>                Number of rows (max 26)");
    eprintln!("  --cols <N>                Number of columns");
    eprintln!("  --config <FILE>           Load sheet settings from a TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Set GRIDCALC_LOG (e.g. GRIDCALC_LOG=debug) for diagnostics.");
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GRIDCALC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn value_arg<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    match args.get(i) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: {} requires {}", flag, what);
            std::process::exit(1);
        }
    }
}

fn size_arg(args: &[String], i: usize, flag: &str) -> usize {
    let raw = value_arg(args, i, flag, "a number");
    match raw.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Error: {} expects a number, got '{}'", flag, raw);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut rows: Option<usize> = None;
    let mut cols: Option<usize> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut no_config = false;
    let mut edits: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-e" | "--edit" => {
                i += 1;
                edits.push(value_arg(&args, i, "--edit", "LABEL=TEXT").to_string());
            }
            "--rows" => {
                i += 1;
                rows = Some(size_arg(&args, i, "--rows"));
            }
            "--cols" => {
                i += 1;
                cols = Some(size_arg(&args, i, "--cols"));
            }
            "--config" => {
                i += 1;
                config_file = Some(PathBuf::from(value_arg(&args, i, "--config", "a file path")));
            }
            "--no-config" => no_config = true,
            arg => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    init_logging();

    let (mut sheet_config, warnings) = config::load_config(config_file.as_deref(), !no_config);
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(rows) = rows {
        sheet_config.rows = rows;
    }
    if let Some(cols) = cols {
        sheet_config.cols = cols;
    }

    match run(sheet_config, &edits) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(config: SheetConfig, edits: &[String]) -> anyhow::Result<i32> {
    let mut sheet =
        Sheet::with_observer(config, Console::default()).context("cannot create sheet")?;
    let mut stdout = io::stdout();

    if !edits.is_empty() {
        for edit in edits {
            execute(&mut sheet, parse_edit(edit)?, &mut stdout)?;
        }
        return Ok(if sheet.observer().rejected() > 0 { 1 } else { 0 });
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        match parse_command(&line) {
            Ok(Some(command)) => {
                if execute(&mut sheet, command, &mut stdout)? {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => eprintln!("Error: {}", err),
        }
    }
    Ok(0)
}
