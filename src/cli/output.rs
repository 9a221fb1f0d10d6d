//! Status lines printed after each operation.

use crate::yaml::Status;
use colored::*;
use std::path::Path;

/// What the status line talks about.
pub struct Report<'a> {
    pub key: &'a str,
    pub path: &'a Path,
    /// Value expected (check) or applied (apply).
    pub value: &'a str,
    /// Value found in the file before any change.
    pub previous: &'a str,
}

fn pass() -> ColoredString {
    "\u{2714}".green()
}

fn fail() -> ColoredString {
    "\u{2717}".red()
}

/// Human readable line for an operation outcome.
pub fn status_line(status: Status, report: &Report) -> String {
    let Report {
        key,
        path,
        value,
        previous,
    } = report;
    let path = path.display();

    match status {
        Status::Correct => format!(
            "{} Key '{}', from file '{}', is correctly set to {}",
            pass(),
            key,
            path,
            value
        ),
        Status::Incorrect => format!(
            "{} Key '{}', from file '{}', is incorrectly set to {} and should be {}",
            fail(),
            key,
            path,
            previous,
            value
        ),
        Status::NotFound => format!("{} cannot find key '{}' from file '{}'", fail(), key, path),
        Status::AlreadySet => format!(
            "{} Key '{}', from file '{}', already set to {}, nothing else need to be done",
            pass(),
            key,
            path,
            value
        ),
        Status::Updated => format!(
            "{} Key '{}', from file '{}', was updated from '{}' to '{}'",
            pass(),
            key,
            path,
            previous,
            value
        ),
    }
}

pub fn print_status(status: Status, report: &Report, quiet: bool) {
    if !quiet {
        println!("{}", status_line(status, report));
    }
}
