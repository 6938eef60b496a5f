//! Fixture file reader

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use super::format::SnapshotFile;
use crate::{Result, StubtapeError};

/// Check whether a fixture file exists
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Read and validate a fixture file
///
/// Returns `Ok(None)` when the file does not exist. A file that exists but
/// does not parse, or parses into invalid values, is an error; nothing is
/// salvaged from it.
///
/// # Errors
///
/// Returns error if the file cannot be read, parsed, or validated
pub async fn read(path: &Path) -> Result<Option<SnapshotFile>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let file: SnapshotFile =
        serde_json::from_slice(&bytes).map_err(|source| StubtapeError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    file.validate().map_err(|e| match e {
        StubtapeError::InvalidSnapshot(msg) => {
            StubtapeError::InvalidSnapshot(format!("{}: {msg}", path.display()))
        }
        other => other,
    })?;

    debug!("Read fixture {} ({} test cases)", path.display(), file.len());
    Ok(Some(file))
}
