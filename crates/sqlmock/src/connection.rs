//! Mock connections.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::{Capabilities, Connection, Context, Statement, Transaction};
use crate::catcher::MockCatcher;
use crate::driver::{DriverState, MockDatabase};
use crate::error::{Error, Result};
use crate::statement::MockStatement;
use crate::transaction::{IsolationLevel, MockTransaction};

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Open, no transaction.
    Ready,
    /// Open with a transaction in progress.
    InTransaction(IsolationLevel),
    /// Closed; every operation fails.
    Closed,
}

impl ConnectionState {
    /// Check if the connection can accept operations.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

#[derive(Debug)]
struct Session {
    db: Option<MockDatabase>,
    tx: Option<IsolationLevel>,
}

/// State shared between a connection, its statements and its transaction.
///
/// Statements and transactions hold only weak references.
#[derive(Debug)]
pub(crate) struct ConnShared {
    session: Mutex<Session>,
}

impl ConnShared {
    pub(crate) fn is_closed(&self) -> bool {
        self.session.lock().db.is_none()
    }

    pub(crate) fn end_transaction(&self) -> Result<()> {
        let mut session = self.session.lock();
        if session.db.is_none() {
            return Err(Error::ConnectionClosed);
        }
        session
            .tx
            .take()
            .map(|_| ())
            .ok_or_else(|| Error::Transaction("no transaction in progress".into()))
    }
}

/// One logical session against a [`MockDatabase`].
///
/// Dropping an open connection closes it.
#[derive(Debug)]
pub struct MockConnection {
    shared: Arc<ConnShared>,
    catcher: MockCatcher,
    driver: Arc<DriverState>,
}

impl MockConnection {
    pub(crate) fn new(db: MockDatabase, catcher: MockCatcher, driver: Arc<DriverState>) -> Self {
        Self {
            shared: Arc::new(ConnShared {
                session: Mutex::new(Session { db: Some(db), tx: None }),
            }),
            catcher,
            driver,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        let session = self.shared.session.lock();
        match (&session.db, session.tx) {
            (None, _) => ConnectionState::Closed,
            (Some(_), Some(level)) => ConnectionState::InTransaction(level),
            (Some(_), None) => ConnectionState::Ready,
        }
    }

    /// Check if the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Check if a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        matches!(self.state(), ConnectionState::InTransaction(_))
    }

    /// The database this connection is bound to, `None` once closed.
    #[must_use]
    pub fn database(&self) -> Option<MockDatabase> {
        self.shared.session.lock().db.clone()
    }

    fn usable_database(&self) -> Result<MockDatabase> {
        let db = self.database().ok_or(Error::ConnectionClosed)?;
        if db.is_bad_connection() {
            return Err(Error::BadConnection);
        }
        Ok(db)
    }

    /// Prepare a statement.
    pub fn prepare_statement(&self, query: &str) -> Result<MockStatement> {
        self.usable_database()?;
        Ok(MockStatement::new(
            query,
            Arc::downgrade(&self.shared),
            self.catcher.clone(),
        ))
    }

    /// Start a transaction at the default isolation level.
    pub fn begin_transaction(&self) -> Result<MockTransaction> {
        self.begin_with(IsolationLevel::default())
    }

    /// Start a transaction at `level`.
    ///
    /// Nested transactions are not supported.
    pub fn begin_with(&self, level: IsolationLevel) -> Result<MockTransaction> {
        let mut session = self.shared.session.lock();
        match &session.db {
            None => return Err(Error::ConnectionClosed),
            Some(db) if db.is_bad_connection() => return Err(Error::BadConnection),
            Some(_) => {}
        }
        if session.tx.is_some() {
            return Err(Error::Transaction("already in a transaction".into()));
        }
        session.tx = Some(level);
        drop(session);

        tracing::debug!(isolation_level = level.name(), "transaction started");
        Ok(MockTransaction::new(Arc::downgrade(&self.shared), level))
    }

    /// Release the database. Closing twice does nothing.
    pub fn disconnect(&self) {
        let released = {
            let mut session = self.shared.session.lock();
            session.tx = None;
            session.db.take()
        };
        if let Some(db) = released {
            self.driver.record_close();
            tracing::debug!(database = db.name(), "connection closed");
        }
    }
}

impl Connection for MockConnection {
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn prepare_context(&mut self, _ctx: &Context, query: &str) -> Result<Box<dyn Statement>> {
        Ok(Box::new(self.prepare_statement(query)?))
    }

    fn begin(&mut self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(self.begin_transaction()?))
    }

    fn close(&mut self) -> Result<()> {
        self.disconnect();
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
