//! The matching engine.
//!
//! A [`MockCatcher`] owns an ordered list of registered mocks. Every
//! statement executed through a [`MockDriver`] connection is resolved
//! against that list by [`MockCatcher::find_response`]: the first eligible
//! mock wins and is marked triggered in the same critical section, so
//! concurrent callers can never both consume a one-time mock.
//!
//! Lock order is catcher state, then the individual mock. Builder calls on a
//! [`Mock`] take only the mock lock and never reach back into the catcher.

use std::sync::Arc;

use parking_lot::Mutex;
use sqlmock_types::SqlValue;

use crate::config::{CatcherConfig, UnmatchedPolicy};
use crate::driver::{DriverState, MockDriver};
use crate::error::{Error, Result};
use crate::response::{Mock, MockResponse};
use crate::sql;

/// Name the default driver is registered under.
pub const DRIVER_NAME: &str = "MOCK_FAKE_DRIVER";

/// Tracing target for statement logging.
pub const LOG_TARGET: &str = "sqlmock::catcher";

#[derive(Debug, Default)]
struct CatcherState {
    mocks: Vec<Mock>,
    config: CatcherConfig,
}

#[derive(Debug, Default)]
struct CatcherInner {
    state: Mutex<CatcherState>,
    driver: Arc<DriverState>,
}

/// Registry of mocks and the matching engine over them.
///
/// Cloning is cheap and shares the registry.
#[derive(Debug, Clone, Default)]
pub struct MockCatcher {
    inner: Arc<CatcherInner>,
}

impl MockCatcher {
    /// Create an empty catcher with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catcher with the given configuration.
    #[must_use]
    pub fn with_config(config: CatcherConfig) -> Self {
        let catcher = Self::default();
        catcher.inner.state.lock().config = config;
        catcher
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> CatcherConfig {
        self.inner.state.lock().config.clone()
    }

    /// Enable or disable tracing of every statement considered.
    pub fn set_logging(&self, enabled: bool) {
        self.inner.state.lock().config.logging = enabled;
    }

    /// Fail unmatched statements with [`Error::NoMockMatched`] instead of
    /// answering with an empty response.
    ///
    /// `true` selects [`UnmatchedPolicy::Fail`], `false` selects
    /// [`UnmatchedPolicy::Fallback`].
    pub fn set_fail_on_unmatched(&self, enabled: bool) {
        let policy = if enabled {
            UnmatchedPolicy::Fail
        } else {
            UnmatchedPolicy::Fallback
        };
        self.set_unmatched_policy(policy);
    }

    /// Alias of [`Self::set_fail_on_unmatched`]: returns an error, never panics.
    ///
    /// For a hard abort use [`set_unmatched_policy`](Self::set_unmatched_policy)
    /// with [`UnmatchedPolicy::Panic`].
    pub fn set_panic_on_empty_response(&self, enabled: bool) {
        self.set_fail_on_unmatched(enabled);
    }

    /// Select what happens when no mock matches.
    pub fn set_unmatched_policy(&self, policy: UnmatchedPolicy) {
        self.inner.state.lock().config.unmatched = policy;
    }

    /// The driver bound to this catcher.
    ///
    /// All drivers obtained from the same catcher share connection counters
    /// and the per-DSN database cache.
    #[must_use]
    pub fn driver(&self) -> MockDriver {
        MockDriver::new(self.clone(), Arc::clone(&self.inner.driver))
    }

    /// Install this catcher's driver in the host driver table under
    /// [`DRIVER_NAME`].
    ///
    /// Repeated calls are no-ops. Returns `true` if this call installed it.
    pub fn register(&self) -> bool {
        self.register_as(DRIVER_NAME)
    }

    /// Install this catcher's driver under a custom name.
    ///
    /// Lets isolated catchers coexist in one process. Repeated calls with a
    /// taken name are no-ops.
    pub fn register_as(&self, name: &str) -> bool {
        let installed = sql::register_if_absent(name, Arc::new(self.driver()));
        if installed {
            tracing::debug!(driver = name, "registered mock driver");
        }
        installed
    }

    /// Append externally built specifications, preserving order.
    pub fn attach<I, M>(&self, mocks: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<Mock>,
    {
        let mut state = self.inner.state.lock();
        state.mocks.extend(mocks.into_iter().map(Into::into));
    }

    /// Append an empty specification and return its handle.
    ///
    /// The new mock matches every statement until configured.
    #[must_use]
    pub fn new_mock(&self) -> Mock {
        let mock = Mock::default();
        self.inner.state.lock().mocks.push(mock.clone());
        mock
    }

    /// Remove every registered mock. Driver registration is unaffected.
    pub fn reset(&self) -> &Self {
        self.inner.state.lock().mocks.clear();
        self
    }

    /// Handles to the registered mocks, in order.
    #[must_use]
    pub fn mocks(&self) -> Vec<Mock> {
        self.inner.state.lock().mocks.clone()
    }

    /// Number of registered mocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().mocks.len()
    }

    /// Check if no mocks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().mocks.is_empty()
    }

    /// Resolve `query` bound with `args` to a response.
    ///
    /// Scans in registration order and marks the first match triggered.
    /// The returned value is a snapshot taken at selection time.
    ///
    /// When nothing matches, the configured [`UnmatchedPolicy`] decides:
    /// an empty response, [`Error::NoMockMatched`], or a panic.
    ///
    /// # Panics
    ///
    /// Only under [`UnmatchedPolicy::Panic`] with no matching mock.
    pub fn find_response(&self, query: &str, args: &[SqlValue]) -> Result<MockResponse> {
        let state = self.inner.state.lock();

        if state.config.logging {
            tracing::info!(target: LOG_TARGET, query, "check query");
        }

        for (index, mock) in state.mocks.iter().enumerate() {
            let mut spec = mock.inner.lock();
            if spec.is_match(query, args) {
                spec.triggered = true;
                tracing::debug!(index, pattern = %spec.pattern, "mock matched");
                return Ok(spec.clone());
            }
        }

        let policy = state.config.unmatched;
        drop(state);

        tracing::warn!(query, policy = %policy, "no mock matches query");
        match policy {
            UnmatchedPolicy::Fallback => Ok(MockResponse::default()),
            UnmatchedPolicy::Fail => Err(Error::NoMockMatched {
                statement: query.to_owned(),
            }),
            UnmatchedPolicy::Panic => unmatched_panic(query),
        }
    }
}

#[allow(clippy::panic)]
fn unmatched_panic(query: &str) -> ! {
    panic!("No responses matches query {query}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registered_match_wins() {
        let catcher = MockCatcher::new();
        let first = catcher.new_mock().with_query("FROM users").with_id(1);
        let _second = catcher.new_mock().with_query("users").with_id(2);

        let spec = catcher.find_response("SELECT * FROM users", &[]).unwrap();
        assert_eq!(spec.last_insert_id(), 1);
        assert!(first.is_triggered());
    }

    #[test]
    fn test_once_falls_through_to_later_mock() {
        let catcher = MockCatcher::new();
        catcher.attach([
            MockResponse::new().with_query("x").with_id(1).one_time(),
            MockResponse::new().with_query("x").with_id(2),
        ]);

        assert_eq!(catcher.find_response("x", &[]).unwrap().last_insert_id(), 1);
        assert_eq!(catcher.find_response("x", &[]).unwrap().last_insert_id(), 2);
        assert_eq!(catcher.find_response("x", &[]).unwrap().last_insert_id(), 2);
    }

    #[test]
    fn test_unmatched_policies() {
        let catcher = MockCatcher::new();
        let spec = catcher.find_response("SELECT 1", &[]).unwrap();
        assert!(spec.reply().is_empty());
        assert!(spec.error().is_none());
        assert_eq!(spec.rows_affected(), 0);

        catcher.set_fail_on_unmatched(true);
        let err = catcher.find_response("SELECT 1", &[]).unwrap_err();
        assert!(err.is_not_matched());
    }

    #[test]
    #[should_panic(expected = "No responses matches query SELECT 2")]
    fn test_panic_policy() {
        let catcher =
            MockCatcher::with_config(CatcherConfig::new().unmatched(UnmatchedPolicy::Panic));
        let _ = catcher.find_response("SELECT 2", &[]);
    }

    #[test]
    fn test_reset_chains() {
        let catcher = MockCatcher::new();
        catcher.attach([MockResponse::new(), MockResponse::new()]);
        assert_eq!(catcher.len(), 2);

        let mock = catcher.reset().new_mock().with_query("only");
        assert_eq!(catcher.len(), 1);
        assert!(catcher.mocks()[0].ptr_eq(&mock));
    }

    #[test]
    fn test_builder_after_registration_is_visible() {
        let catcher = MockCatcher::new();
        let mock = catcher.new_mock();
        assert!(catcher.find_response("anything", &[]).is_ok());
        let _ = mock.with_query("nothing like it");
        catcher.set_panic_on_empty_response(true);
        assert!(catcher.find_response("anything", &[]).is_err());
    }
}
