mod def;
include!(concat!(env!("OUT_DIR"), "/rustc_version.rs"));
use clap::Parser;

pub mod log;
mod output;

use crate::yaml::{Session, Status};
use output::{print_status, Report};

/// Key path problems that did not stop the operation.
fn report_warnings(warnings: &[crate::yaml::Error]) {
    for warning in warnings {
        ::log::warn!("{}", warning);
    }
}

impl From<crate::yaml::Error> for String {
    fn from(e: crate::yaml::Error) -> Self {
        e.to_string()
    }
}

pub fn run() -> Result<bool, String> {
    let cli = def::Args::parse();

    // Split log strings upon comma, trim them and flatten all in
    // `logs`, remove empty values
    let logs = cli.log.unwrap_or_default();
    let logs = logs
        .iter()
        .flat_map(|log| log.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>();

    // Upon failure, display error message and usage string
    log::setup(cli.verbose, logs, cli.log_time)?;

    if cli.color && cli.no_color {
        return Err("Cannot use both --color and --no-color".to_string());
    }
    if cli.color {
        colored::control::set_override(true);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.version {
        println!("version: {}", env!("CARGO_PKG_VERSION"));
        println!("Rust: {}", RUSTC_VERSION);
        return Ok(true);
    }

    let session = |file: &str, key: &str, value: &str| {
        Session::new(&cli.dir, file, key, value)
            .strict(cli.strict)
            .scope(cli.scope)
            .indent(cli.indent)
    };

    match &cli.action {
        Some(def::Actions::Check { file, key, value }) => {
            let session = session(file, key, value);
            let inspection = session.inspect()?;
            report_warnings(&inspection.warnings);
            let path = session.path();
            let report = Report {
                key,
                path: &path,
                value,
                previous: &inspection.previous,
            };
            print_status(inspection.status(), &report, cli.quiet);
            Ok(inspection.matches)
        }
        Some(def::Actions::Apply {
            file,
            key,
            value,
            dry_run,
        }) => {
            let session = session(file, key, value).dry_run(*dry_run);
            let application = session.apply()?;
            report_warnings(&application.warnings);
            let path = session.path();
            let report = Report {
                key,
                path: &path,
                value,
                previous: &application.previous,
            };
            print_status(application.status(), &report, cli.quiet);
            if application.written {
                ::log::debug!("saved '{}'", path.display());
            }
            Ok(application.found)
        }
        Some(def::Actions::Get { file, key }) => {
            let session = session(file, key, "");
            let lookup = session.get()?;
            report_warnings(&lookup.warnings);
            match lookup.value {
                Some(value) => {
                    println!("{}", value);
                    Ok(true)
                }
                None if cli.quiet => Ok(false),
                None => {
                    let path = session.path();
                    let report = Report {
                        key,
                        path: &path,
                        value: "",
                        previous: "",
                    };
                    Err(output::status_line(Status::NotFound, &report))
                }
            }
        }
        None => Err("Missing action".to_string()),
    }
}
