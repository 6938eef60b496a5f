//! A running test case

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;

use super::{AutoStub, TestContext};
use crate::config::IdleConfig;
use crate::fixture::TestCase;
use crate::network::{ExchangeId, Interceptor, ObservedRequest, RequestTicket, Route};
use crate::storage::RecordedExchange;
use crate::Result;

/// Handle the network shim and the test driver use while a test case runs
///
/// Methods take `&self`; wrap the session in an `Arc` to report exchanges
/// from several tasks at once.
pub struct TestSession {
    test: TestCase,
    strategy: Arc<dyn AutoStub>,
    interceptor: Interceptor,
    context: Mutex<TestContext>,
    idle: IdleConfig,
}

impl TestSession {
    pub(crate) fn new(
        test: TestCase,
        strategy: Arc<dyn AutoStub>,
        interceptor: Interceptor,
        context: TestContext,
        idle: IdleConfig,
    ) -> Self {
        Self {
            test,
            strategy,
            interceptor,
            context: Mutex::new(context),
            idle,
        }
    }

    /// The test case this session belongs to
    #[must_use]
    pub fn test(&self) -> &TestCase {
        &self.test
    }

    /// Routing decision for a request, without reporting it
    #[must_use]
    pub fn route(&self, method: &str, url: &str) -> Route {
        self.interceptor.route(method, url)
    }

    /// Report an outbound request; the ticket says whether to stub, intercept, or pass it through
    pub fn request_observed(&self, request: ObservedRequest) -> RequestTicket {
        self.interceptor.request_observed(request)
    }

    /// Report the response for an earlier request
    ///
    /// # Errors
    ///
    /// Returns error if `id` does not match an outstanding request
    pub async fn response_observed(&self, id: ExchangeId, body: Value) -> Result<()> {
        if let Some(exchange) = self.interceptor.response_observed(id, body)? {
            let mut context = self.context.lock().await;
            self.strategy.on_exchange_observed(&mut context, &exchange);
        }
        Ok(())
    }

    /// Requests currently counted as in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.interceptor.counter().count()
    }

    /// Wait for the network to go quiet, using the configured poll interval and timeout
    ///
    /// # Errors
    ///
    /// Returns error if requests are still in flight when the timeout elapses
    pub async fn wait_until_idle(&self) -> Result<()> {
        self.interceptor
            .counter()
            .wait_until_idle(
                Duration::from_millis(self.idle.poll_interval_ms),
                Duration::from_millis(self.idle.timeout_ms),
            )
            .await
    }

    /// The interceptor for this test case
    #[must_use]
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Copy of the exchanges buffered so far
    pub async fn recorded(&self) -> Vec<RecordedExchange> {
        self.context.lock().await.records().to_vec()
    }

    /// Number of exact stubs installed at setup
    pub async fn stubs_installed(&self) -> usize {
        self.context.lock().await.stubs_installed()
    }

    pub(crate) fn into_context(self) -> TestContext {
        self.context.into_inner()
    }
}
