//! Host registry and URL normalization
//!
//! Recorded URLs are stored without their backend host so a fixture captured
//! against one environment replays against another. The host is kept as a
//! position in the registry, so registry order must not change between the
//! recording run and the replay run.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Result, StubtapeError};

/// Stored value for an exchange whose URL matched no registered host
pub const UNMATCHED_HOST_INDEX: i64 = -1;

/// Registry position of the host an exchange was recorded against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostIndex {
    /// Matched the host at this registry position
    Matched(usize),
    /// No host matched; the URL was stored verbatim
    Unmatched,
}

impl HostIndex {
    /// Wire representation (`-1` for [`HostIndex::Unmatched`])
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            HostIndex::Matched(index) => index as i64,
            HostIndex::Unmatched => UNMATCHED_HOST_INDEX,
        }
    }

    /// Parse the wire representation
    ///
    /// # Errors
    ///
    /// Returns error for any negative value other than `-1`
    pub fn from_i64(value: i64) -> Result<Self> {
        if value == UNMATCHED_HOST_INDEX {
            return Ok(HostIndex::Unmatched);
        }
        usize::try_from(value).map(HostIndex::Matched).map_err(|_| {
            StubtapeError::InvalidSnapshot(format!(
                "matchHostIndex must be >= -1, got {value}"
            ))
        })
    }
}

impl fmt::Display for HostIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

impl Serialize for HostIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for HostIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        HostIndex::from_i64(value).map_err(serde::de::Error::custom)
    }
}

/// Ordered list of backend base URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRegistry {
    hosts: Vec<String>,
}

impl HostRegistry {
    /// Create a registry from already-split host strings
    ///
    /// # Errors
    ///
    /// Returns error if any host is empty after trimming
    pub fn new<I, S>(hosts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Vec::new();
        for (i, host) in hosts.into_iter().enumerate() {
            let host = host.as_ref().trim();
            // An empty host is a substring of every URL and would swallow all traffic.
            if host.is_empty() {
                return Err(StubtapeError::ConfigError(format!(
                    "apiHosts entry {i} is empty"
                )));
            }
            registry.push(host.to_string());
        }
        Ok(Self { hosts: registry })
    }

    /// Parse a comma-separated host list
    ///
    /// # Errors
    ///
    /// Returns error if any entry is empty
    pub fn parse(list: &str) -> Result<Self> {
        if list.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::new(list.split(','))
    }

    /// Number of registered hosts
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Host at a registry position
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.hosts.get(index).map(String::as_str)
    }

    /// Iterate hosts in registry order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// Split a full URL into its host-relative part and the matching registry position
    ///
    /// The first registered host that occurs anywhere in `url` wins, and its
    /// first occurrence is removed. Without a match the URL comes back as-is.
    #[must_use]
    pub fn normalize(&self, url: &str) -> (String, HostIndex) {
        for (i, host) in self.hosts.iter().enumerate() {
            if url.contains(host.as_str()) {
                return (url.replacen(host.as_str(), "", 1), HostIndex::Matched(i));
            }
        }
        (url.to_string(), HostIndex::Unmatched)
    }

    /// Rebuild a full URL from a stored relative URL
    ///
    /// # Errors
    ///
    /// Returns error if the index is beyond the current registry
    pub fn resolve(&self, relative: &str, index: HostIndex) -> Result<String> {
        match index {
            HostIndex::Unmatched => Ok(relative.to_string()),
            HostIndex::Matched(i) => {
                let host = self.get(i).ok_or(StubtapeError::HostIndexOutOfRange {
                    index: i,
                    len: self.len(),
                })?;
                Ok(format!("{host}{relative}"))
            }
        }
    }
}
