//! Reading and writing store records

use crate::domain::{MigrationError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default cap on records read from one directory
pub const DEFAULT_MAX_FILES: usize = 1000;

const ALLOWED_EXTENSIONS: [&str; 2] = [".json", ".md"];

/// A record read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl StoredFile {
    /// Decodes the contents as JSON
    ///
    /// # Errors
    ///
    /// `MigrationError::Serialization` naming the file.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.contents).map_err(|e| {
            MigrationError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }
}

/// Writes `value` as pretty JSON, creating parent directories
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_bytes(path, &bytes).await
}

/// Writes raw bytes, creating parent directories
pub async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            MigrationError::Io(format!("create {}: {e}", parent.display()))
        })?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| MigrationError::Io(format!("write {}: {e}", path.display())))
}

/// Reads up to `max_files` files with the given extension from `dir`
///
/// `extension` may be given with or without the leading dot; an empty string
/// means `.json`. Only `.json` and `.md` are accepted. Subdirectories and
/// unreadable files are skipped. Files are returned in name order so repeated
/// runs see the same subset.
///
/// # Errors
///
/// An unsupported extension or an unreadable directory.
pub fn read_files_from_dir(
    dir: &Path,
    extension: &str,
    max_files: usize,
) -> Result<Vec<StoredFile>> {
    let extension = normalize_extension(extension);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(MigrationError::InvalidValue(format!(
            "unsupported file type: {extension}"
        )));
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| MigrationError::Io(format!("read directory {}: {e}", dir.display())))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(&extension))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    let mut files = Vec::new();
    for path in candidates {
        if files.len() >= max_files {
            tracing::warn!(
                dir = %dir.display(),
                max_files,
                "Directory holds more records than the read limit; remaining files ignored"
            );
            break;
        }
        match std::fs::read(&path) {
            Ok(contents) => files.push(StoredFile { path, contents }),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file"),
        }
    }

    Ok(files)
}

fn normalize_extension(extension: &str) -> String {
    match extension {
        "" => ".json".to_string(),
        e if e.starts_with('.') => e.to_string(),
        e => format!(".{e}"),
    }
}
