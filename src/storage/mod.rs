//! JSON fixture storage for recorded snapshots

mod format;
mod reader;
mod writer;

pub use format::{Payload, RecordedExchange, SnapshotFile, TestCaseSnapshot};
pub use writer::merge_test_case;

use std::path::{Path, PathBuf};

use crate::Result;

/// Fixture store rooted at a fixtures directory
///
/// Relative paths are resolved against the root; absolute paths are used as-is.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fixtures directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a fixture name against the root
    #[must_use]
    pub fn path_for(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Check whether a fixture exists
    pub async fn exists(&self, name: impl AsRef<Path>) -> bool {
        reader::exists(&self.path_for(name)).await
    }

    /// Read a fixture, `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns error if the fixture is unreadable or fails validation
    pub async fn read(&self, name: impl AsRef<Path>) -> Result<Option<SnapshotFile>> {
        reader::read(&self.path_for(name)).await
    }

    /// Overwrite a fixture
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub async fn write(&self, name: impl AsRef<Path>, file: &SnapshotFile) -> Result<()> {
        writer::write(&self.path_for(name), file).await
    }

    /// Load a single test case's snapshot, `None` if the fixture or the title is missing
    ///
    /// # Errors
    ///
    /// Returns error if the fixture exists but is unreadable
    pub async fn load_test_case(
        &self,
        name: impl AsRef<Path>,
        title: &str,
    ) -> Result<Option<TestCaseSnapshot>> {
        Ok(self
            .read(name)
            .await?
            .and_then(|file| file.get(title).cloned()))
    }

    /// Replace one test case's entry in a fixture
    ///
    /// # Errors
    ///
    /// Returns error if the fixture cannot be read or written
    pub async fn merge(
        &self,
        name: impl AsRef<Path>,
        title: &str,
        timestamp: String,
        records: Vec<RecordedExchange>,
    ) -> Result<()> {
        writer::merge_test_case(&self.path_for(name), title, timestamp, records).await
    }
}
