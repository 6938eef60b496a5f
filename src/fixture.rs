//! Test case identity and fixture file naming

use std::path::{Path, PathBuf};

use crate::config::FixtureNamingConfig;
use crate::{Result, StubtapeError};

/// Separator between suite titles and the test title in a full title
pub const TITLE_SEPARATOR: &str = " ";

/// A single test case, identified by its source file and full title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestCase {
    spec_path: String,
    title: String,
}

impl TestCase {
    /// Create a test case from a spec path and fully-qualified title
    ///
    /// # Errors
    ///
    /// Returns error if the title is blank or contains control characters
    pub fn new(spec_path: impl Into<String>, title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        validate_title(&title)?;
        Ok(Self {
            spec_path: spec_path.into(),
            title,
        })
    }

    /// Build the full title from the suite path followed by the test name
    ///
    /// # Errors
    ///
    /// Returns error if the joined title is invalid
    pub fn from_titles<I, S>(spec_path: impl Into<String>, titles: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let title = titles
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(TITLE_SEPARATOR);
        Self::new(spec_path, title)
    }

    /// Source file of the test, relative to the test root
    #[must_use]
    pub fn spec_path(&self) -> &str {
        &self.spec_path
    }

    /// Fully-qualified title, used as the snapshot key
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Validate a test case title
fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StubtapeError::InvalidTestName(
            "Test title cannot be empty".to_string(),
        ));
    }

    if title.chars().any(char::is_control) {
        return Err(StubtapeError::InvalidTestName(format!(
            "Test title cannot contain control characters: {title:?}"
        )));
    }

    Ok(())
}

/// Fixture file name for a spec path, e.g. `integration/users.spec.ts` -> `users.api.snapshot.json`
#[must_use]
pub fn fixture_name(spec_path: &str, naming: &FixtureNamingConfig) -> String {
    let name = spec_path.replace('\\', "/");
    let name = name.strip_prefix(naming.strip_prefix.as_str()).unwrap_or(&name);
    let name = name.strip_suffix(naming.strip_suffix.as_str()).unwrap_or(name);
    format!("{name}{}", naming.suffix)
}

/// Full path of the fixture file for a test case
#[must_use]
pub fn fixture_path(fixtures_dir: &Path, test: &TestCase, naming: &FixtureNamingConfig) -> PathBuf {
    fixtures_dir.join(fixture_name(test.spec_path(), naming))
}
