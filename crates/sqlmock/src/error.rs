//! Driver error types.

use std::sync::Arc;

use thiserror::Error;

/// A user-supplied error carried by a mock and returned verbatim.
pub type MockedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the mock driver and matching engine.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    /// No registered mock matched and the catcher is configured to fail.
    #[error("query not mocked: {statement}")]
    NoMockMatched {
        /// Statement text that found no mock.
        statement: String,
    },

    /// Error configured on the matched mock, passed through unchanged.
    #[error("{0}")]
    Mocked(MockedError),

    /// Simulated broken connection from an exception hook.
    #[error("bad connection")]
    BadConnection,

    /// Cursor was used after close.
    #[error("cursor is closed")]
    CursorClosed,

    /// Connection was used after close.
    #[error("connection closed")]
    ConnectionClosed,

    /// Statement was used after close.
    #[error("statement closed")]
    StatementClosed,

    /// Transaction state error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Optional driver operation that this implementation does not provide.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// Direct execution declined; prepare a statement instead.
    #[error("driver skipped fast path, use a prepared statement")]
    Skip,

    /// Driver registration failure.
    #[error("driver registration error: {0}")]
    Registration(String),

    /// No driver registered under the requested name.
    #[error("unknown driver {0:?} (forgotten register?)")]
    UnknownDriver(String),

    /// Type conversion error.
    #[error("type error: {0}")]
    Type(#[from] sqlmock_types::TypeError),
}

impl Error {
    /// Wrap a user error so it is returned verbatim from execution.
    pub fn mocked<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Mocked(Arc::new(err))
    }

    /// Check if this is the simulated broken-connection error.
    #[must_use]
    pub fn is_bad_connection(&self) -> bool {
        matches!(self, Self::BadConnection)
    }

    /// Check if this error reports an unmocked statement.
    #[must_use]
    pub fn is_not_matched(&self) -> bool {
        matches!(self, Self::NoMockMatched { .. })
    }

    /// Check if a host application could reasonably retry.
    ///
    /// Only connection-loss conditions qualify; the mock itself never retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BadConnection | Self::ConnectionClosed)
    }

    /// The user error carried by a mock, if this is one.
    #[must_use]
    pub fn mocked_source(&self) -> Option<&MockedError> {
        match self {
            Self::Mocked(err) => Some(err),
            _ => None,
        }
    }

    /// Downcast the carried user error to its concrete type.
    #[must_use]
    pub fn downcast_mocked_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.mocked_source().and_then(|err| err.downcast_ref::<E>())
    }
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, Error>;
