//! Logging setup for the command line.
//!
//! Log lines go to stderr so they never mix with values printed on stdout.

use colored::*;
use log::{Level, LevelFilter};
use time::macros::format_description;
use time::OffsetDateTime;

fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parse a `target[=level]` component spec. A bare target logs everything.
fn parse_component(spec: &str) -> Result<(String, LevelFilter), String> {
    let (target, level) = match spec.split_once('=') {
        Some((target, level)) => {
            let level = level
                .trim()
                .parse::<LevelFilter>()
                .map_err(|_| format!("Invalid log level '{}' in '{}'", level.trim(), spec))?;
            (target.trim(), level)
        }
        None => (spec.trim(), LevelFilter::Trace),
    };
    if target.is_empty() {
        return Err(format!("Missing log target in '{}'", spec));
    }
    let target = if target.contains("::") || target == env!("CARGO_CRATE_NAME") {
        target.to_string()
    } else {
        format!("{}::yaml::{}", env!("CARGO_CRATE_NAME"), target)
    };
    Ok((target, level))
}

fn colored_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".bright_red(),
        Level::Warn => "WARN ".yellow(),
        Level::Info => "INFO ".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".dimmed(),
    }
}

pub fn setup(verbose: u8, logs: Vec<&str>, log_time: bool) -> Result<(), String> {
    let mut dispatch = fern::Dispatch::new().level(level_from_verbosity(verbose));

    for spec in logs {
        let (target, level) = parse_component(spec)?;
        dispatch = dispatch.level_for(target, level);
    }

    dispatch
        .format(move |out, message, record| {
            let prefix = if log_time {
                let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
                let stamp = now
                    .format(format_description!(
                        "[hour]:[minute]:[second].[subsecond digits:3] "
                    ))
                    .unwrap_or_default();
                stamp.as_str().dimmed().to_string()
            } else {
                String::new()
            };
            out.finish(format_args!(
                "{}{} {} {}",
                prefix,
                colored_level(record.level()),
                record.target().dimmed(),
                message
            ))
        })
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| format!("Failed to set up logging: {}", e))
}
