//! Import configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. CLI flags override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Source cited by meanings whose row names none.
pub const DEFAULT_FALLBACK_SOURCE: &str = "ИМК";

/// `Non-connector` value that still marks a row for merging.
pub const DEFAULT_MERGE_MARKER: &str = "объед";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Primary (syntactic) dataset.
    pub syntax_path: PathBuf,
    /// Secondary (dictionary) dataset.
    pub data_path: PathBuf,
    /// Where the JSON snapshot is written. No snapshot if unset.
    pub output_path: Option<PathBuf>,
    /// Field delimiter of both datasets. Must be a single ASCII character.
    pub delimiter: char,
    pub fallback_source: String,
    pub merge_marker: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            syntax_path: PathBuf::from("syntax.csv"),
            data_path: PathBuf::from("data.csv"),
            output_path: None,
            delimiter: ',',
            fallback_source: DEFAULT_FALLBACK_SOURCE.to_string(),
            merge_marker: DEFAULT_MERGE_MARKER.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl ImportConfig {
    /// Read a JSON config file and validate it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        if self.fallback_source.trim().is_empty() {
            return Err(Error::Config("fallback_source must not be empty".into()));
        }
        if self.merge_marker.trim().is_empty() {
            return Err(Error::Config("merge_marker must not be empty".into()));
        }
        Ok(())
    }

    /// The delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::Config(format!("delimiter {:?} is not an ASCII character", self.delimiter)))
    }
}
