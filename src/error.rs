//! Error types for Stubtape

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for Stubtape operations
pub type Result<T> = std::result::Result<T, StubtapeError>;

/// Errors that can occur in Stubtape
#[derive(Debug, Error)]
pub enum StubtapeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fixture file is not valid JSON or does not match the snapshot schema
    #[error("Unreadable fixture {path}: {source}")]
    Json {
        /// Fixture file that failed to parse
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Fixture parsed but holds values the replayer cannot use
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A stub pattern failed to compile
    #[error("Invalid stub pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as written in the configuration
        pattern: String,
        /// Compilation error
        #[source]
        source: regex::Error,
    },

    /// Invalid test case title
    #[error("Invalid test name: {0}")]
    InvalidTestName(String),

    /// Recorded host index does not exist in the current host registry
    #[error("Host index {index} out of range: registry has {len} host(s)")]
    HostIndexOutOfRange {
        /// Index stored in the fixture
        index: usize,
        /// Current registry size
        len: usize,
    },

    /// Response observed for an exchange that was never requested (or already completed)
    #[error("Response observed for unknown exchange #{0}")]
    UnknownExchange(u64),

    /// Network did not go idle in time
    #[error("Network not idle after {waited:?}: {pending} request(s) still in flight")]
    IdleTimeout {
        /// Requests still pending when the wait gave up
        pending: usize,
        /// How long the wait lasted
        waited: Duration,
    },
}
