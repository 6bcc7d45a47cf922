mod debug_report;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use cutflow::{Cutflow, Exports, Orientation, ReportOptions};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

struct CliConfig {
    input: PathBuf,
    options: ReportOptions,
    output: bool,
    exports: Exports,
    color: bool,
}

fn run(config: &CliConfig) -> cutflow::Result<()> {
    let cutflow = Cutflow::read_cflow(&config.input)?;
    let written =
        if config.output { cutflow.write_reports(&config.options, config.exports)? } else { Vec::new() };
    debug_report::print_report(&config.input.display().to_string(), &cutflow, &written, config.color);
    Ok(())
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<PathBuf> = None;
    let mut options = ReportOptions::default();
    let mut output = false;
    let mut exports = Exports::empty();
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("cutflow {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--csv" => exports |= Exports::CSV,
            "--mermaid" => exports |= Exports::MERMAID,
            "--cflow" => exports |= Exports::CFLOW,
            "--out" | "-o" => {
                let value = args.next().ok_or_else(|| "error: --out expects a directory".to_string())?;
                options = options.output_dir(value);
                output = true;
            }
            "--orientation" => {
                let value = args.next().ok_or_else(|| "error: --orientation expects TD or LR".to_string())?;
                options = options.orientation(parse_orientation(&value)?);
            }
            _ if arg.starts_with("--out=") => {
                options = options.output_dir(arg.trim_start_matches("--out="));
                output = true;
            }
            _ if arg.starts_with("--orientation=") => {
                options = options.orientation(parse_orientation(arg.trim_start_matches("--orientation="))?);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(PathBuf::from(arg));
            }
        }
    }

    let Some(input) = input else {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    };
    if exports.is_empty() {
        exports = Exports::all();
    } else if !output {
        return Err("error: --csv, --mermaid and --cflow need --out <dir>".to_string());
    }

    Ok(CliConfig { input, options, output, exports, color })
}

fn parse_orientation(value: &str) -> Result<Orientation, String> {
    value.parse().map_err(|err| format!("error: {err}"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "cutflow {version}

Inspect and re-export cutflow snapshots.

Usage:
  cutflow [OPTIONS] <file.cflow>

Options:
  -o, --out <dir>            Write exports to <dir> (created if missing).
  --cflow                    Export the .cflow snapshot.
  --csv                      Export one CSV table per rightmost path.
  --mermaid                  Export a mermaid flowchart.
                             Without any of these, --out writes all three.
  --orientation <TD|LR>      Mermaid graph orientation. Default: TD
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   Log filter (default: warn).

Exit codes:
  0  Success.
  1  Unreadable snapshot or failed export.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
