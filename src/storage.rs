//! JSON-file-per-document persistence shared by all stores
//!
//! Each document lives at `<dir>/<id>.json`. Writes go through a hidden temp
//! file and a rename so a crash never leaves a half-written document behind.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// Load all JSON files from a directory, skipping unreadable or corrupt ones
pub fn load_json_files<T: DeserializeOwned>(dir: &Path) -> Vec<T> {
    let mut items = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
            }
            return items;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    items
}

/// Write one document, replacing any previous version
pub async fn write_json<T: Serialize>(dir: &Path, id: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = dir.join(format!(".{}.json.tmp", id));
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, document_path(dir, id)).await?;
    Ok(())
}

/// Remove one document. Missing files are not an error.
pub async fn remove_json(dir: &Path, id: &str) -> Result<()> {
    match tokio::fs::remove_file(document_path(dir, id)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn document_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.json", id))
}

/// Prefixed random identifier, e.g. `sub-6f1c...`
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}
