//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;

/// Loan acceptance risk report over the bank personal-loan dataset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "loan_data.csv")]
    pub input: PathBuf,

    /// Spreadsheet loaded when the CSV file does not exist
    #[arg(long, default_value = "/content/Bank_Personal_Loan_Modelling.xlsx")]
    pub fallback: PathBuf,

    /// Worksheet holding the data in the fallback spreadsheet
    #[arg(long, default_value = "Data")]
    pub sheet: String,

    /// Number of ranked factors to print
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Analysis date printed in the header (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Enable verbose (debug) logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn report_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Default log filter when RUST_LOG is unset
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
