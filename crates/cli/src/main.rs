// Crosscheck CLI - headless bank reconciliation

mod config;
mod exit_codes;
mod fetch;
mod ledger;
mod run;
mod statement;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "xcheck")]
#[command(about = "Reconcile a bank statement CSV against an ERPNext general ledger")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the statement against the ledger and write the report
    #[command(after_help = "\
Examples:
  xcheck run --config run.toml
  xcheck run --config run.toml --json | jq .report.summary
  xcheck run --config run.toml --quiet; echo $?
  XCHECK_ERP_KEY=... XCHECK_ERP_SECRET=... xcheck run --config run.toml")]
    Run {
        /// Run config (TOML)
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// Report destination (overrides the config)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Suppress stderr diagnostics
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Check a run config without touching the network
    #[command(after_help = "\
Examples:
  xcheck validate --config run.toml")]
    Validate {
        /// Run config (TOML)
        #[arg(long, short = 'c')]
        config: PathBuf,
    },

    /// Print the balanced GL listing for the configured account
    #[command(after_help = "\
Examples:
  xcheck ledger --config run.toml
  xcheck ledger --config run.toml --quiet > ledger.txt")]
    Ledger {
        /// Run config (TOML)
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// Print the entries as JSON instead of the table
        #[arg(long)]
        json: bool,

        /// Suppress stderr diagnostics
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  crosscheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ncontract_version(run): 1",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  crosscheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ncontract_version(run): 1",
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: xcheck <command> [options]");
            eprintln!("       xcheck --help for more information");
            Ok(())
        }
        Some(Commands::Run { config, report, json, quiet }) => {
            run::cmd_run(&config, report, json, quiet)
        }
        Some(Commands::Validate { config }) => run::cmd_validate(&config),
        Some(Commands::Ledger { config, json, quiet }) => ledger::cmd_ledger(&config, json, quiet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
