// src/bin/cli.rs
use std::process::ExitCode;

use trade_watch::cli;

fn main() -> ExitCode {
    cli::main()
}
