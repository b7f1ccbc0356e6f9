// midio CLI - monthly MID chargeback and fraud-alert reporting

mod exit_codes;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use exit_codes::{store_exit_code, EXIT_ERROR, EXIT_REPORT_EXPORT, EXIT_SUCCESS, EXIT_USAGE};
use midio_io::StoreError;

#[derive(Parser)]
#[command(name = "midio")]
#[command(about = "Monthly MID chargeback / fraud-alert report generator")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the month-by-month report for a date window
    #[command(after_help = "\
Examples:
  midio report --db mids.db --from 2017-01-01 --to 2018-10-31 --out report.xlsx
  midio report --db mids.db --from 2017-01-01 --to 2017-01-31 --out jan.csv
  midio report --db mids.db --from 2017-01-01 --to 2017-06-30 --out h1.xlsx --json")]
    Report {
        /// Report database (SQLite)
        #[arg(long, env = "MIDIO_DB")]
        db: PathBuf,

        /// Window start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: String,

        /// Window end date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: String,

        /// Output file
        #[arg(long, short = 'o')]
        out: PathBuf,

        /// Output format (inferred from the --out extension when omitted)
        #[arg(long, short = 'f')]
        format: Option<OutputFormat>,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Suppress progress output
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Print the columns a date window would produce, without a database
    #[command(after_help = "\
Examples:
  midio columns --from 2017-01-01 --to 2017-03-31
  midio columns --from 2017-01-01 --to 2017-03-31 --json")]
    Columns {
        /// Window start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: String,

        /// Window end date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: String,

        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },
}

/// Export format. Inferred from the output extension unless forced.
#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum OutputFormat {
    Csv,
    Xlsx,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: midio <command> [options]");
            eprintln!("       midio --help for more information");
            Ok(())
        }
        Some(Commands::Report { db, from, to, out, format, json, quiet }) => {
            report::cmd_report(db, &from, &to, out, format, json, quiet)
        }
        Some(Commands::Columns { from, to, json }) => report::cmd_columns(&from, &to, json),
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

    pub fn export(msg: impl Into<String>) -> Self {
        Self { code: EXIT_REPORT_EXPORT, message: msg.into(), hint: None }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from store error with proper exit code.
    pub fn store(err: StoreError) -> Self {
        let hint = match &err {
            StoreError::Connection { .. } => {
                Some("pass --db or set MIDIO_DB to the report database".to_string())
            }
            _ => None,
        };
        Self { code: store_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
