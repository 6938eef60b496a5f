//! Fixture file writer and per-test-case merge

use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, info};

use super::format::{RecordedExchange, SnapshotFile, TestCaseSnapshot};
use super::reader;
use crate::{Result, StubtapeError};

/// Write a whole fixture file, replacing any previous contents
///
/// Output is 2-space indented JSON with a trailing newline. Missing parent
/// directories are created.
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub async fn write(path: &Path, file: &SnapshotFile) -> Result<()> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    file.serialize(&mut serializer)
        .map_err(|source| StubtapeError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    buffer.push(b'\n');

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(path, buffer).await?;
    debug!("Wrote fixture {} ({} test cases)", path.display(), file.len());
    Ok(())
}

/// Store one test case's records in a fixture, leaving every other entry alone
///
/// Read-modify-write: not atomic, and two processes merging into the same
/// fixture concurrently will lose one side's update.
///
/// # Errors
///
/// Returns error if an existing fixture cannot be read or the write fails
pub async fn merge_test_case(
    path: &Path,
    title: &str,
    timestamp: String,
    records: Vec<RecordedExchange>,
) -> Result<()> {
    let record_count = records.len();
    let snapshot = TestCaseSnapshot { timestamp, records };

    let file = if reader::exists(path).await {
        // A vanished file between the check and the read is treated as new.
        let mut file = reader::read(path).await?.unwrap_or_default();
        file.insert(title, snapshot);
        file
    } else {
        let mut file = SnapshotFile::new();
        file.insert(title, snapshot);
        file
    };

    write(path, &file).await?;

    info!(
        "Saved {} exchange(s) for '{}' to {}",
        record_count,
        title,
        path.display()
    );
    Ok(())
}
