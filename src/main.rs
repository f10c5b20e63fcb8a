//! forge – command-line payslip / bank-statement renderer.
//!
//! Usage:
//!   forge <payslip|statement> <input.json> [output.pdf] [--timestamp "YYYY-MM-DD HH:MM:SS"]
//!
//! If `output.pdf` is omitted the attachment filename suggested by the
//! engine is used, in the input file's directory.

use std::{env, fs, path::PathBuf, process};

use chrono::NaiveDateTime;

use ledger_forge::{
    render_payslip, render_statement, PayslipInput, RenderOptions, StatementInput,
};

enum Kind {
    Payslip,
    Statement,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut kind: Option<Kind> = None;
    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut timestamp: Option<NaiveDateTime> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--timestamp" | "-t" => match iter.next().map(|v| parse_timestamp(v)) {
                Some(Ok(ts)) => timestamp = Some(ts),
                Some(Err(e)) => {
                    eprintln!("Invalid --timestamp: {e}");
                    process::exit(1);
                }
                None => {
                    eprintln!("--timestamp needs a value");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            value => {
                match positional {
                    0 => {
                        kind = match value {
                            "payslip" => Some(Kind::Payslip),
                            "statement" => Some(Kind::Statement),
                            _ => {
                                eprintln!("Unknown document kind: {value}");
                                print_usage(&args[0]);
                                process::exit(1);
                            }
                        }
                    }
                    1 => input_path = Some(PathBuf::from(value)),
                    2 => output_path = Some(PathBuf::from(value)),
                    _ => {
                        eprintln!("Unexpected argument: {value}");
                        print_usage(&args[0]);
                        process::exit(1);
                    }
                }
                positional += 1;
            }
        }
    }

    let (kind, input) = match (kind, input_path) {
        (Some(k), Some(p)) => (k, p),
        _ => {
            eprintln!("Error: document kind and input file are required.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let json = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let options = match timestamp {
        Some(ts) => RenderOptions::at(ts),
        None => RenderOptions::default(),
    };

    let result = match kind {
        Kind::Payslip => PayslipInput::from_json(&json).and_then(|r| render_payslip(&r, &options)),
        Kind::Statement => {
            StatementInput::from_json(&json).and_then(|r| render_statement(&r, &options))
        }
    };

    let doc = match result {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error generating PDF: {e}");
            process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    };

    // Default output: input directory + the engine's attachment filename.
    let output = output_path.unwrap_or_else(|| {
        input
            .parent()
            .map(|dir| dir.join(&doc.filename))
            .unwrap_or_else(|| PathBuf::from(&doc.filename))
    });

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(&output, &doc.bytes) {
        eprintln!("Error writing '{}': {e}", output.display());
        process::exit(1);
    }
    let pages = doc.page_count();
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        doc.bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
}

fn print_usage(prog: &str) {
    eprintln!("forge – payslip and bank statement renderer (ledger-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <payslip|statement> <input.json> [output.pdf] [--timestamp \"YYYY-MM-DD HH:MM:SS\"]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <payslip|statement>  Kind of document described by the input record");
    eprintln!("  <input.json>         JSON record (logos as base64 data URIs)");
    eprintln!("  [output.pdf]         Output path (default: suggested attachment name next to input)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --timestamp, -t  Footer timestamp (default: now); fix it for repeatable output");
    eprintln!("  --help           Print this message");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to trace page breaks.");
}
