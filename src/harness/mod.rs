//! Per-test-case lifecycle for record and replay
//!
//! A run picks one [`AutoStub`] implementation up front. Each test case then
//! goes through setup, any number of exchanges, and teardown, carrying its
//! state in a [`TestContext`] rather than in anything shared between tests.

mod driver;
mod session;

pub use driver::Harness;
pub use session::TestSession;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::Mode;
use crate::fixture::TestCase;
use crate::network::{Exchange, Interceptor};
use crate::storage::RecordedExchange;
use crate::Result;

/// Mode-specific behaviour at each lifecycle step
#[async_trait]
pub trait AutoStub: Send + Sync {
    /// Which mode this implements
    fn mode(&self) -> Mode;

    /// Prepare a test case: install rules on the interceptor and build its context
    async fn on_test_setup(&self, test: &TestCase, interceptor: &Interceptor)
        -> Result<TestContext>;

    /// Handle an intercepted exchange that just completed
    fn on_exchange_observed(&self, context: &mut TestContext, exchange: &Exchange);

    /// Finish a test case, consuming its context
    async fn on_test_teardown(&self, context: TestContext) -> Result<()>;
}

/// State owned by one test case from setup to teardown
#[derive(Debug, Clone)]
pub struct TestContext {
    test: TestCase,
    fixture: PathBuf,
    records: Vec<RecordedExchange>,
    stubs_installed: usize,
}

impl TestContext {
    /// Fresh context with an empty exchange buffer
    #[must_use]
    pub fn new(test: TestCase, fixture: impl Into<PathBuf>) -> Self {
        Self {
            test,
            fixture: fixture.into(),
            records: Vec::new(),
            stubs_installed: 0,
        }
    }

    /// The test case
    #[must_use]
    pub fn test(&self) -> &TestCase {
        &self.test
    }

    /// Fixture file name, relative to the fixtures directory
    #[must_use]
    pub fn fixture(&self) -> &Path {
        &self.fixture
    }

    /// Exchanges buffered so far, in observation order
    #[must_use]
    pub fn records(&self) -> &[RecordedExchange] {
        &self.records
    }

    /// Append an exchange to the buffer
    pub fn push_record(&mut self, record: RecordedExchange) {
        self.records.push(record);
    }

    /// Take the buffer, leaving it empty
    pub fn take_records(&mut self) -> Vec<RecordedExchange> {
        std::mem::take(&mut self.records)
    }

    /// Number of exact stubs installed at setup
    #[must_use]
    pub fn stubs_installed(&self) -> usize {
        self.stubs_installed
    }

    /// Record how many exact stubs setup installed
    pub fn set_stubs_installed(&mut self, count: usize) {
        self.stubs_installed = count;
    }
}
