// SPDX-License-Identifier: AGPL-3.0-or-later
//! Persisted context document
//!
//! A JSON object on local disk holding values derived by earlier runs and
//! consumed by the deployment layer. Merges are shallow and
//! non-destructive: keys written by this run replace prior values, every
//! other key is kept as-is. Single writer assumed.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};

/// Parsed context document
pub type ContextDocument = Map<String, Value>;

/// Reads and merges the context document at a fixed path
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing file is an empty document; a file that
    /// is not a JSON object is an error.
    pub async fn load(&self) -> Result<ContextDocument> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No context file, starting empty");
                return Ok(ContextDocument::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(self.parse_error("expected a JSON object")),
            Err(e) => Err(self.parse_error(e.to_string())),
        }
    }

    /// Merge `fields` over the stored document and write the result back.
    pub async fn merge(&self, fields: &BTreeMap<String, String>) -> Result<ContextDocument> {
        let existing = self.load().await?;
        let merged = merge_fields(existing, fields);
        self.save(&merged).await?;
        info!(
            path = %self.path.display(),
            keys = fields.len(),
            "Saved context info"
        );
        Ok(merged)
    }

    /// Replace the file with `document`. The new content is written to a
    /// sibling temporary file and renamed over the target, so readers see
    /// either the old document or the new one.
    pub async fn save(&self, document: &ContextDocument) -> Result<()> {
        let rendered = serde_json::to_string_pretty(document)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, rendered.as_bytes()))
            .await
            .map_err(|e| io::Error::new(ErrorKind::Other, e))??;
        Ok(())
    }

    fn parse_error(&self, message: impl Into<String>) -> BridgeError {
        BridgeError::ContextParse {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }
}

fn replace_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// One-level override of `existing` with `fields`
pub fn merge_fields(
    mut existing: ContextDocument,
    fields: &BTreeMap<String, String>,
) -> ContextDocument {
    for (key, value) in fields {
        existing.insert(key.clone(), Value::String(value.clone()));
    }
    existing
}
