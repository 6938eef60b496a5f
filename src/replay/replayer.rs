//! Replayer: install recorded responses as exact stubs

use async_trait::async_trait;
use tracing::{debug, info, trace, warn};

use crate::config::{Config, FixtureNamingConfig, Mode};
use crate::fixture::{fixture_name, TestCase};
use crate::harness::{AutoStub, TestContext};
use crate::hosts::HostRegistry;
use crate::network::{Exchange, Interceptor};
use crate::storage::{SnapshotStore, TestCaseSnapshot};
use crate::Result;

/// Replay-mode strategy
pub struct Replayer {
    hosts: HostRegistry,
    store: SnapshotStore,
    naming: FixtureNamingConfig,
}

impl Replayer {
    /// Create a replayer from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the host list is invalid
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            hosts: config.host_registry()?,
            store: SnapshotStore::new(&config.fixtures_dir),
            naming: config.fixture_naming.clone(),
        })
    }

    /// Install one exact stub per recorded exchange, in stored order
    ///
    /// A later record for the same method and URL replaces the earlier stub.
    /// Returns the number of distinct stubs left installed.
    ///
    /// # Errors
    ///
    /// Returns error if a record's host index is not in the current registry
    pub fn install(&self, snapshot: &TestCaseSnapshot, interceptor: &Interceptor) -> Result<usize> {
        for record in &snapshot.records {
            let url = self.hosts.resolve(&record.url, record.match_host_index)?;
            if interceptor.stub_exact(&record.method, &url, record.response.body.clone()) {
                debug!("Duplicate stub {} {}: later response wins", record.method, url);
            }
            trace!("Stubbed {} {}", record.method, url);
        }
        Ok(interceptor.exact_rule_count())
    }
}

#[async_trait]
impl AutoStub for Replayer {
    fn mode(&self) -> Mode {
        Mode::Replay
    }

    async fn on_test_setup(
        &self,
        test: &TestCase,
        interceptor: &Interceptor,
    ) -> Result<TestContext> {
        let fixture = fixture_name(test.spec_path(), &self.naming);
        let mut context = TestContext::new(test.clone(), &fixture);

        let Some(snapshot) = self.store.load_test_case(&fixture, test.title()).await? else {
            warn!(
                "No recorded API data for '{}' in {}; requests will go unmocked",
                test.title(),
                fixture
            );
            return Ok(context);
        };

        let installed = self.install(&snapshot, interceptor)?;
        context.set_stubs_installed(installed);

        info!(
            "Replaying '{}': {} stub(s) from {} (recorded {})",
            test.title(),
            installed,
            fixture,
            snapshot.timestamp
        );
        Ok(context)
    }

    fn on_exchange_observed(&self, _context: &mut TestContext, exchange: &Exchange) {
        trace!("Replay observed {} {}", exchange.method, exchange.url);
    }

    async fn on_test_teardown(&self, context: TestContext) -> Result<()> {
        debug!("Replay finished for '{}'", context.test().title());
        Ok(())
    }
}
