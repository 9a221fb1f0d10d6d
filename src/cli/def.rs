use crate::yaml::Scope;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Checks and updates values in YAML files by key path
#[derive(Parser)]
#[command(author, about, long_about=None, disable_version_flag(true))]
pub struct Args {
    /// force color mode (defaults to check tty)
    #[arg(long)]
    pub color: bool,

    /// force no-color mode (defaults to check tty)
    #[arg(long)]
    pub no_color: bool,

    /// display version and quit
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// prepend time to each log line
    #[arg(long)]
    pub log_time: bool,

    /// Turn general verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configure component wise logging
    #[arg(long, short, action = clap::ArgAction::Append)]
    pub log: Option<Vec<String>>,

    /// quiet status messages and path errors
    #[arg(short, long)]
    pub quiet: bool,

    /// fail on key paths containing YAML special characters
    #[arg(long)]
    pub strict: bool,

    /// Directory holding the YAML file
    #[arg(short = 'C', long, default_value = ".")]
    pub dir: PathBuf,

    /// How keys of different nesting levels are told apart (column|depth)
    #[arg(long, default_value = "column")]
    pub scope: Scope,

    /// Indentation width for rewritten block values
    #[arg(long, default_value_t = crate::yaml::DEFAULT_INDENT)]
    pub indent: usize,

    #[command(subcommand)]
    pub action: Option<Actions>,
}

#[derive(Subcommand)]
pub enum Actions {
    Check {
        /// Check that a key holds the expected value, without writing

        /// The YAML file, relative to --dir
        #[clap(name = "FILE")]
        file: String,

        /// The key path to check
        #[clap(name = "KEY")]
        key: String,

        /// The expected value
        #[clap(name = "VALUE")]
        value: String,
    },
    Apply {
        /// Set a key to a value and save the file

        /// The YAML file, relative to --dir
        #[clap(name = "FILE")]
        file: String,

        /// The key path to update
        #[clap(name = "KEY")]
        key: String,

        /// The value to set
        #[clap(name = "VALUE")]
        value: String,

        /// Report what would change without writing the file
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    Get {
        /// Print the current value of a key

        /// The YAML file, relative to --dir
        #[clap(name = "FILE")]
        file: String,

        /// The key path to read
        #[clap(name = "KEY")]
        key: String,
    },
}
