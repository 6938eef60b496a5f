//! Harness selecting record or replay for a whole run

use std::sync::Arc;

use tracing::{debug, info};

use super::{AutoStub, TestSession};
use crate::config::{Config, Mode};
use crate::fixture::TestCase;
use crate::network::{InFlightCounter, Interceptor};
use crate::recording::Recorder;
use crate::replay::Replayer;
use crate::Result;

/// Entry point for a test run
pub struct Harness {
    config: Arc<Config>,
    strategy: Arc<dyn AutoStub>,
}

impl Harness {
    /// Build the harness for the configured mode
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or a stub pattern does not compile
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let strategy: Arc<dyn AutoStub> = match config.mode() {
            Mode::Record => Arc::new(Recorder::new(&config)?),
            Mode::Replay => Arc::new(Replayer::new(&config)?),
        };

        info!(
            "API auto recording: {}",
            if strategy.mode().is_record() { "ON" } else { "OFF" }
        );

        Ok(Self {
            config: Arc::new(config),
            strategy,
        })
    }

    /// Mode for this run
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.strategy.mode()
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a test case
    ///
    /// # Errors
    ///
    /// Returns error if the strategy's setup fails (e.g. an unreadable fixture in replay)
    pub async fn setup(&self, test: TestCase) -> Result<TestSession> {
        let mode = self.mode();
        let counter = InFlightCounter::new(self.config.debounce_for(mode));
        let interceptor = Interceptor::new(counter);

        debug!("Setting up '{}' ({:?})", test.title(), mode);
        let context = self.strategy.on_test_setup(&test, &interceptor).await?;

        Ok(TestSession::new(
            test,
            Arc::clone(&self.strategy),
            interceptor,
            context,
            self.config.idle.clone(),
        ))
    }

    /// Finish a test case
    ///
    /// # Errors
    ///
    /// Returns error if persisting the recording fails
    pub async fn teardown(&self, session: TestSession) -> Result<()> {
        debug!("Tearing down '{}'", session.test().title());
        self.strategy.on_test_teardown(session.into_context()).await
    }
}
