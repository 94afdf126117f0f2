mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::solve::SolveArgs;
use frontier_core::FrontierError;

/// Markowitz efficient frontier solver
#[derive(Parser)]
#[command(
    name = "frontier",
    version,
    about = "Markowitz efficient frontier solver",
    long_about = "Computes minimum-variance portfolios on the Markowitz efficient frontier. \
                  Reads expected returns, a covariance matrix and target returns as a text \
                  or JSON request, and emits one (risk, return) pair per target."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log to stderr (-v debug, -vv trace). Defaults to RUST_LOG or warn.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a frontier request read from --input or stdin
    Solve(SolveArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Bare result object with a `frontier` field
    Json,
    /// Result plus methodology, assumptions, warnings and metadata
    Envelope,
    Table,
    Csv,
    /// One `risk return` line per point
    Text,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Solve(args) => commands::solve::run_solve(args),
        Commands::Version => {
            println!("frontier {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(out) => {
            let stdout = io::stdout();
            if let Err(e) = output::format_output(&mut stdout.lock(), &cli.output, &out) {
                eprintln!("{}: failed to write response: {}", "error".red().bold(), e);
                process::exit(1);
            }
            process::exit(0);
        }
        Err(e) => {
            match e.downcast_ref::<FrontierError>() {
                Some(fe) => eprintln!("{}: {}: {}", "error".red().bold(), fe.kind(), fe),
                None => eprintln!("{}: {}", "error".red().bold(), e),
            }
            process::exit(1);
        }
    }
}
