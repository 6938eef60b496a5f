//! Configuration types for Stubtape

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hosts::HostRegistry;
use crate::{Result, StubtapeError};

/// Environment variable overriding `autoRecordEnabled`
pub const ENV_AUTO_RECORD: &str = "STUBTAPE_AUTO_RECORD";
/// Environment variable overriding `apiHosts`
pub const ENV_API_HOSTS: &str = "STUBTAPE_API_HOSTS";
/// Environment variable overriding `stubAPIPatterns`
pub const ENV_STUB_API_PATTERNS: &str = "STUBTAPE_STUB_API_PATTERNS";

/// Operating mode, fixed for a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Record mode: hit the real backend and capture traffic
    Record,
    /// Replay mode: serve responses from fixtures
    Replay,
}

impl Mode {
    /// Check if mode is Record
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, Mode::Record)
    }

    /// Check if mode is Replay
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self, Mode::Replay)
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Record against the live backend instead of replaying fixtures
    #[serde(rename = "autoRecordEnabled", default)]
    pub auto_record_enabled: bool,
    /// Comma-separated, ordered list of backend base URLs
    #[serde(rename = "apiHosts", default)]
    pub api_hosts: String,
    /// Comma-separated list of regular expressions to intercept while recording
    #[serde(rename = "stubAPIPatterns", default)]
    pub stub_api_patterns: String,
    /// Directory holding fixture files
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,
    /// In-flight counter debounce
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Idle wait behaviour
    #[serde(default)]
    pub idle: IdleConfig,
    /// Spec path to fixture name mapping
    #[serde(default)]
    pub fixture_naming: FixtureNamingConfig,
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("cypress/fixtures")
}

/// Debounce applied before the in-flight counter drops to zero
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Delay while recording, absorbs gaps between chained calls
    pub record_ms: u64,
    /// Delay while replaying; stubs answer synchronously
    pub replay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            record_ms: 500,
            replay_ms: 0,
        }
    }
}

/// Polling parameters for `wait_until_idle`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    /// Interval between counter polls
    pub poll_interval_ms: u64,
    /// Give up after this long
    pub timeout_ms: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            timeout_ms: 10_000,
        }
    }
}

/// How a test source path becomes a fixture file name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureNamingConfig {
    /// Directory prefix removed from the spec path
    pub strip_prefix: String,
    /// File suffix removed from the spec path
    pub strip_suffix: String,
    /// Suffix appended to form the fixture name
    pub suffix: String,
}

impl Default for FixtureNamingConfig {
    fn default() -> Self {
        Self {
            strip_prefix: "integration/".to_string(),
            strip_suffix: ".spec.ts".to_string(),
            suffix: ".api.snapshot.json".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_record_enabled: false,
            api_hosts: String::new(),
            stub_api_patterns: String::new(),
            fixtures_dir: default_fixtures_dir(),
            debounce: DebounceConfig::default(),
            idle: IdleConfig::default(),
            fixture_naming: FixtureNamingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StubtapeError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| StubtapeError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from environment-style key/value pairs
    ///
    /// # Errors
    ///
    /// Returns error if `STUBTAPE_AUTO_RECORD` is not a boolean
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            match key.as_ref() {
                ENV_AUTO_RECORD => {
                    let value: String = value.into();
                    self.auto_record_enabled = parse_bool(&value).ok_or_else(|| {
                        StubtapeError::ConfigError(format!(
                            "{ENV_AUTO_RECORD} must be a boolean, got '{value}'"
                        ))
                    })?;
                }
                ENV_API_HOSTS => self.api_hosts = value.into(),
                ENV_STUB_API_PATTERNS => self.stub_api_patterns = value.into(),
                _ => {}
            }
        }
        Ok(())
    }

    /// Run mode selected by `autoRecordEnabled`
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.auto_record_enabled {
            Mode::Record
        } else {
            Mode::Replay
        }
    }

    /// Debounce delay for the given mode
    #[must_use]
    pub fn debounce_for(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Record => Duration::from_millis(self.debounce.record_ms),
            Mode::Replay => Duration::from_millis(self.debounce.replay_ms),
        }
    }

    /// Build the host registry from `apiHosts`
    ///
    /// # Errors
    ///
    /// Returns error if the list contains an empty entry
    pub fn host_registry(&self) -> Result<HostRegistry> {
        HostRegistry::parse(&self.api_hosts)
    }

    /// Individual pattern strings from `stubAPIPatterns`, trimmed, empties skipped
    #[must_use]
    pub fn stub_patterns(&self) -> Vec<&str> {
        self.stub_api_patterns
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.api_hosts.trim().is_empty() {
            return Err(StubtapeError::ConfigError(
                "apiHosts must list at least one host".to_string(),
            ));
        }

        self.host_registry()?;

        if self.fixtures_dir.as_os_str().is_empty() {
            return Err(StubtapeError::ConfigError(
                "fixtures_dir cannot be empty".to_string(),
            ));
        }

        if self.fixture_naming.suffix.is_empty() {
            return Err(StubtapeError::ConfigError(
                "fixture_naming.suffix cannot be empty".to_string(),
            ));
        }

        if self.idle.poll_interval_ms == 0 {
            return Err(StubtapeError::ConfigError(
                "idle.poll_interval_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            autoRecordEnabled = true
            apiHosts = "https://api.example.com, https://auth.example.com"
            stubAPIPatterns = "/api/.*, /auth/.*"
            fixtures_dir = "e2e/fixtures"

            [debounce]
            record_ms = 250
            replay_ms = 0
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.mode(), Mode::Record);
        assert_eq!(config.stub_patterns(), vec!["/api/.*", "/auth/.*"]);
        assert_eq!(config.fixtures_dir, PathBuf::from("e2e/fixtures"));
        assert_eq!(config.debounce_for(Mode::Record), Duration::from_millis(250));
        assert_eq!(config.debounce_for(Mode::Replay), Duration::ZERO);
        assert_eq!(config.host_registry().unwrap().len(), 2);
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str(r#"apiHosts = "https://api.example.com""#).unwrap();

        assert_eq!(config.mode(), Mode::Replay);
        assert!(config.stub_patterns().is_empty());
        assert_eq!(config.fixtures_dir, PathBuf::from("cypress/fixtures"));
        assert_eq!(config.debounce.record_ms, 500);
        assert_eq!(config.fixture_naming.suffix, ".api.snapshot.json");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = r#"
            autoRecordEnabled = false
            apiHosts = "https://api.example.com"
        "#;
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.mode(), Mode::Replay);
    }

    #[test]
    fn test_invalid_config_no_hosts() {
        let config: Config = toml::from_str("autoRecordEnabled = true").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_empty_host_entry() {
        let config: Config =
            toml::from_str(r#"apiHosts = "https://a.example.com,,https://b.example.com""#)
                .unwrap();
        assert!(matches!(
            config.validate(),
            Err(StubtapeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env([
                (ENV_AUTO_RECORD, "true"),
                (ENV_API_HOSTS, "http://localhost:3000"),
                (ENV_STUB_API_PATTERNS, "/graphql"),
                ("UNRELATED", "ignored"),
            ])
            .unwrap();

        assert_eq!(config.mode(), Mode::Record);
        assert_eq!(config.api_hosts, "http://localhost:3000");
        assert_eq!(config.stub_patterns(), vec!["/graphql"]);
    }

    #[test]
    fn test_env_override_rejects_garbage_bool() {
        let mut config = Config::default();
        assert!(config.apply_env([(ENV_AUTO_RECORD, "maybe")]).is_err());
    }
}
