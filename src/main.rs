use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bcsplit::command::Commands;
use bcsplit::runtime::{setup_global_logger, LogLevel, LogMode};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    // trace, debug, info, warn or error
    #[arg(long = "log-level", global = true, default_value = "info")]
    log_level: LogLevel,

    // terminal, path or discard
    #[arg(long = "log-mode", global = true, default_value = "terminal")]
    log_mode: LogMode,

    // Log file used with --log-mode path
    #[arg(long = "log-path", global = true, default_value = "bcsplit.log")]
    log_path: PathBuf,
}

fn main() -> ExitCode {
    let mut cli = Cli::parse();

    if let Err(e) = setup_global_logger(cli.log_level, cli.log_mode, cli.log_path.clone()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = cli.command.try_execute() {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
