//! Recorder: capture live traffic into fixtures

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{Config, FixtureNamingConfig, Mode};
use crate::fixture::{fixture_name, TestCase};
use crate::harness::{AutoStub, TestContext};
use crate::hosts::{HostIndex, HostRegistry};
use crate::network::{compile_patterns, Exchange, Interceptor, INTERCEPTED_METHODS};
use crate::storage::{Payload, RecordedExchange, SnapshotStore};
use crate::Result;

/// Record-mode strategy
pub struct Recorder {
    hosts: HostRegistry,
    patterns: Vec<Regex>,
    store: SnapshotStore,
    naming: FixtureNamingConfig,
}

impl Recorder {
    /// Create a recorder from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the host list is invalid or a stub pattern does not compile
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            hosts: config.host_registry()?,
            patterns: compile_patterns(config.stub_patterns())?,
            store: SnapshotStore::new(&config.fixtures_dir),
            naming: config.fixture_naming.clone(),
        })
    }

    /// Host registry used for normalization
    #[must_use]
    pub fn hosts(&self) -> &HostRegistry {
        &self.hosts
    }

    /// Convert a completed exchange into its stored form
    #[must_use]
    pub fn to_record(&self, exchange: &Exchange) -> RecordedExchange {
        normalize_exchange(&self.hosts, exchange)
    }
}

/// Strip the registered host from an exchange's URL; bodies are kept as-is
#[must_use]
pub fn normalize_exchange(hosts: &HostRegistry, exchange: &Exchange) -> RecordedExchange {
    let (url, match_host_index) = hosts.normalize(&exchange.url);
    RecordedExchange {
        url,
        method: exchange.method.clone(),
        request: Payload::new(exchange.request_body.clone()),
        response: Payload::new(exchange.response_body.clone()),
        match_host_index,
    }
}

/// Timestamp stored with each snapshot, e.g. `2024-05-01T10:00:00.000Z`
#[must_use]
pub fn snapshot_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl AutoStub for Recorder {
    fn mode(&self) -> Mode {
        Mode::Record
    }

    async fn on_test_setup(
        &self,
        test: &TestCase,
        interceptor: &Interceptor,
    ) -> Result<TestContext> {
        for pattern in &self.patterns {
            for method in INTERCEPTED_METHODS {
                interceptor.intercept_pattern(method, pattern.clone());
            }
        }

        let fixture = fixture_name(test.spec_path(), &self.naming);
        debug!(
            "Recording '{}' into {} ({} pattern(s))",
            test.title(),
            fixture,
            self.patterns.len()
        );

        Ok(TestContext::new(test.clone(), fixture))
    }

    fn on_exchange_observed(&self, context: &mut TestContext, exchange: &Exchange) {
        let record = self.to_record(exchange);

        if record.match_host_index == HostIndex::Unmatched {
            warn!(
                "No registered host matches {}; storing full URL, replay cannot relocate it",
                exchange.url
            );
        }

        debug!(
            "Recorded {} {} (host {})",
            record.method, record.url, record.match_host_index
        );
        context.push_record(record);
    }

    async fn on_test_teardown(&self, mut context: TestContext) -> Result<()> {
        let records = context.take_records();
        info!(
            "API recorded for '{}': {} exchange(s)",
            context.test().title(),
            records.len()
        );

        self.store
            .merge(
                context.fixture(),
                context.test().title(),
                snapshot_timestamp(),
                records,
            )
            .await
    }
}
