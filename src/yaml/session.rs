//! File level operations: check a key, update a key, read a key.
//!
//! Every operation reads the file, parses it, resolves the key and then
//! decides whether anything has to be written. Nothing is kept between
//! operations.

use super::error::Error;
use super::mutation::replace;
use super::path::KeyPath;
use super::query::{Match, Scope};
use super::serialize::{encode, DEFAULT_INDENT};
use super::tree::Document;
use std::fs;
use std::path::PathBuf;

/// What an operation found out about the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Key holds the expected value
    Correct,
    /// Key holds another value
    Incorrect,
    /// Key could not be resolved
    NotFound,
    /// Key already holds the value to apply
    AlreadySet,
    /// Key was given the new value
    Updated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub found: bool,
    pub previous: String,
    /// True only when the key exists and holds the expected value.
    pub matches: bool,
    pub warnings: Vec<Error>,
}

impl Inspection {
    pub fn status(&self) -> Status {
        match (self.found, self.matches) {
            (false, _) => Status::NotFound,
            (true, true) => Status::Correct,
            (true, false) => Status::Incorrect,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub found: bool,
    pub previous: String,
    pub changed: bool,
    /// The file on disk was overwritten.
    pub written: bool,
    pub warnings: Vec<Error>,
}

impl Application {
    pub fn status(&self) -> Status {
        match (self.found, self.changed) {
            (false, _) => Status::NotFound,
            (true, false) => Status::AlreadySet,
            (true, true) => Status::Updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub value: Option<String>,
    pub warnings: Vec<Error>,
}

/// One key of one file, and the value it should hold.
#[derive(Debug, Clone)]
pub struct Session {
    pub dir: PathBuf,
    pub file: String,
    pub key: String,
    pub value: String,
    pub dry_run: bool,
    /// Reject key paths with invalid segments instead of warning.
    pub strict: bool,
    pub scope: Scope,
    pub indent: usize,
}

impl Session {
    pub fn new(dir: impl Into<PathBuf>, file: &str, key: &str, value: &str) -> Self {
        Session {
            dir: dir.into(),
            file: file.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            dry_run: false,
            strict: false,
            scope: Scope::default(),
            indent: DEFAULT_INDENT,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Full path of the target file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }

    fn load(&self) -> Result<(Document, KeyPath), Error> {
        let key = if self.strict {
            KeyPath::parse_strict(&self.key)?
        } else {
            KeyPath::parse(&self.key)
        };
        let path = self.path();
        let data = fs::read_to_string(&path)
            .map_err(|e| Error::Io(format!("cannot read '{}': {}", path.display(), e)))?;
        let doc = Document::parse(&data).map_err(|e| match e {
            Error::Parse(msg) => Error::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        Ok((doc, key))
    }

    /// Resolve the key, giving it `new_value` when that is set.
    fn lookup(
        &self,
        doc: &mut Document,
        key: &KeyPath,
        new_value: Option<&str>,
    ) -> Result<Match, Error> {
        let found = replace(doc, key, new_value, self.scope)?;
        if !found.found {
            log::info!(
                "cannot find key '{}' from file '{}'",
                self.key,
                self.path().display()
            );
        }
        Ok(found)
    }

    /// Check that the key holds `value`, without touching the file.
    pub fn inspect(&self) -> Result<Inspection, Error> {
        let (mut doc, key) = self.load()?;
        let found = self.lookup(&mut doc, &key, None)?;
        let matches = found.found && found.previous == self.value;

        if found.found && matches {
            log::info!("key '{}' is correctly set to '{}'", self.key, self.value);
        } else if found.found {
            log::info!(
                "key '{}' is set to '{}' instead of '{}'",
                self.key,
                found.previous,
                self.value
            );
        }

        Ok(Inspection {
            found: found.found,
            previous: found.previous,
            matches,
            warnings: key.diagnostics().to_vec(),
        })
    }

    /// Give the key the value `value`, writing the file unless in dry run.
    pub fn apply(&self) -> Result<Application, Error> {
        let (mut doc, key) = self.load()?;
        let found = self.lookup(&mut doc, &key, Some(self.value.as_str()))?;
        let mut result = Application {
            found: found.found,
            previous: found.previous.clone(),
            changed: false,
            written: false,
            warnings: key.diagnostics().to_vec(),
        };

        if !found.found {
            return Ok(result);
        }
        if !doc.is_dirty() {
            log::info!("key '{}' already set to '{}'", self.key, self.value);
            return Ok(result);
        }

        result.changed = true;
        log::info!(
            "key '{}' updated from '{}' to '{}'",
            self.key,
            found.previous,
            self.value
        );

        if self.dry_run {
            log::info!("dry run, '{}' left untouched", self.path().display());
            return Ok(result);
        }

        let encoded = encode(&doc, self.indent)?;
        let path = self.path();
        fs::write(&path, encoded)
            .map_err(|e| Error::Io(format!("cannot write '{}': {}", path.display(), e)))?;
        result.written = true;
        Ok(result)
    }

    /// Current scalar value of the key, if it resolves.
    pub fn get(&self) -> Result<Lookup, Error> {
        let (mut doc, key) = self.load()?;
        let found = self.lookup(&mut doc, &key, None)?;
        Ok(Lookup {
            value: found.found.then_some(found.previous),
            warnings: key.diagnostics().to_vec(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
