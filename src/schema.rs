//! Schema description loading.
//!
//! The description is free text (table definitions plus notes on value
//! enumerations) handed to the model when generating queries. It is read once
//! at startup and shared read-only for the life of the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{OracleError, Result};

/// Immutable schema text shared across requests
#[derive(Clone)]
pub struct SchemaDescription {
    text: Arc<str>,
    source: PathBuf,
}

impl SchemaDescription {
    /// Read the description from disk.
    ///
    /// A missing, unreadable or blank file is a configuration error; the
    /// service cannot generate queries without it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            error!("Schema description not loaded from {}: {}", path.display(), e);
            OracleError::Configuration(format!(
                "schema description unreadable at {}: {}",
                path.display(),
                e
            ))
        })?;

        if text.trim().is_empty() {
            error!("Schema description at {} is empty", path.display());
            return Err(OracleError::Configuration(format!(
                "schema description at {} is empty",
                path.display()
            )));
        }

        info!(
            "Loaded schema description from {} ({} bytes)",
            path.display(),
            text.len()
        );

        Ok(Self {
            text: Arc::from(text),
            source: path.to_path_buf(),
        })
    }

    /// Build from in-memory text (tests, embedded deployments)
    pub fn from_text(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(OracleError::Configuration(
                "schema description is empty".to_string(),
            ));
        }
        Ok(Self {
            text: Arc::from(text),
            source: PathBuf::from("<memory>"),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl std::fmt::Debug for SchemaDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaDescription")
            .field("source", &self.source)
            .field("bytes", &self.text.len())
            .finish()
    }
}
