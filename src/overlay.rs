//! Overlay store
//!
//! Tip pages ("overlays") live in one YAML document: a top-level mapping
//! from git subcommand name to a record. The document is re-read on every
//! lookup. Whatever goes wrong while reading it (missing file, unreadable
//! file, bad YAML, wrong shape) the caller just sees "no tips"; the reason
//! is only logged.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Catalog compiled into the binary, used when no document is on disk
pub const BUILTIN_CATALOG: &str = include_str!("../data/overlays.yml");

/// Tips for one git subcommand
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct OverlayRecord {
    /// Canonical subcommand name. Filled from the catalog key when missing.
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub when_to_use: Option<Vec<String>>,
    #[serde(default)]
    pub examples: Option<Vec<OverlayExample>>,
}

/// One example invocation with an optional plain-language note
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct OverlayExample {
    #[serde(default)]
    pub cmd: String,
    #[serde(default)]
    pub say: Option<String>,
}

impl OverlayRecord {
    /// Copy of this record with `command` set, unless it already has one
    pub fn with_default_command(self, command: &str) -> Self {
        if self.command.is_empty() {
            Self {
                command: command.to_string(),
                ..self
            }
        } else {
            self
        }
    }
}

/// Why a catalog could not be used. Only ever logged.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("overlay document not found: {0}")]
    Missing(PathBuf),

    #[error("overlay document unreadable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("overlay document malformed: {origin}: {reason}")]
    Malformed { origin: String, reason: String },
}

/// Where the catalog document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlaySource {
    File(PathBuf),
    Builtin,
}

/// Name → record mapping, straight from the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayCatalog {
    entries: Mapping,
}

impl OverlayCatalog {
    /// Parse a document. An empty document is an empty catalog.
    pub fn parse(text: &str, origin: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| CatalogError::Malformed {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        match value {
            Value::Mapping(entries) => Ok(Self { entries }),
            Value::Null => Ok(Self::default()),
            other => Err(CatalogError::Malformed {
                origin: origin.to_string(),
                reason: format!("expected a mapping at the top level, found {}", kind(&other)),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record for `command`, or `None` when absent, not a valid record, or
    /// naming a different command
    pub fn get(&self, command: &str) -> Option<OverlayRecord> {
        let value = self.entries.get(command)?;
        if !value.is_mapping() {
            debug!(command, kind = kind(value), "overlay entry is not a mapping");
            return None;
        }
        match serde_yaml::from_value::<OverlayRecord>(value.clone()) {
            Ok(record) if !record.command.is_empty() && record.command != command => {
                debug!(
                    command,
                    declared = %record.command,
                    "overlay entry names another command"
                );
                None
            }
            Ok(record) => Some(record.with_default_command(command)),
            Err(e) => {
                warn!(command, error = %e, "overlay entry has an invalid shape");
                None
            }
        }
    }

    /// String keys whose value is a mapping, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, value)| value.is_mapping())
            .filter_map(|(key, _)| key.as_str().map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Looks up tip pages from one catalog document
#[derive(Debug, Clone)]
pub struct OverlayStore {
    source: OverlaySource,
}

impl OverlayStore {
    /// Store reading the document at `path`
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: OverlaySource::File(path.into()),
        }
    }

    /// Store reading the catalog compiled into the binary
    pub fn builtin() -> Self {
        Self {
            source: OverlaySource::Builtin,
        }
    }

    /// Pick the catalog location: an explicit path wins, then
    /// `data/overlays.yml` next to the executable, then the built-in one.
    pub fn locate(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            return Self::from_path(path);
        }

        let installed = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("data").join("overlays.yml")));
        match installed {
            Some(path) if path.is_file() => Self::from_path(path),
            _ => Self::builtin(),
        }
    }

    pub fn source(&self) -> &OverlaySource {
        &self.source
    }

    /// Read and parse the document, keeping the failure reason
    pub fn try_catalog(&self) -> Result<OverlayCatalog, CatalogError> {
        match &self.source {
            OverlaySource::Builtin => OverlayCatalog::parse(BUILTIN_CATALOG, "<builtin>"),
            OverlaySource::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        CatalogError::Missing(path.clone())
                    } else {
                        CatalogError::Unreadable {
                            path: path.clone(),
                            source: e,
                        }
                    }
                })?;
                OverlayCatalog::parse(&text, &path.display().to_string())
            }
        }
    }

    /// The catalog, or an empty one if it can't be read
    pub fn catalog(&self) -> OverlayCatalog {
        match self.try_catalog() {
            Ok(catalog) => catalog,
            Err(e @ CatalogError::Missing(_)) => {
                debug!(error = %e, "no overlay document");
                OverlayCatalog::default()
            }
            Err(e) => {
                warn!(error = %e, "ignoring overlay document");
                OverlayCatalog::default()
            }
        }
    }

    /// Tips for `command`, or `None`
    pub fn load(&self, command: &str) -> Option<OverlayRecord> {
        self.catalog().get(command)
    }

    /// All subcommands with tips, sorted
    pub fn list_names(&self) -> Vec<String> {
        self.catalog().names()
    }
}
