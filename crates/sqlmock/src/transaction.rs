//! Transaction support.
//!
//! A mock transaction does no work of its own. It only occupies the
//! connection's single transaction slot from `begin` until commit, rollback
//! or drop.

use std::sync::Weak;

use crate::api::Transaction;
use crate::connection::ConnShared;
use crate::error::{Error, Result};

/// Transaction isolation level.
///
/// Recorded on the connection state; the mock enforces no isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Read uncommitted (dirty reads allowed).
    ReadUncommitted,
    /// Read committed.
    #[default]
    ReadCommitted,
    /// Repeatable read.
    RepeatableRead,
    /// Serializable (highest isolation).
    Serializable,
}

impl IsolationLevel {
    /// Get the SQL statement to set this isolation level.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "SET TRANSACTION ISOLATION LEVEL READ UNCOMMITTED",
            Self::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            Self::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            Self::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }

    /// Get the isolation level name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// An open transaction on a [`MockConnection`](crate::MockConnection).
///
/// Dropping it without committing rolls it back.
#[derive(Debug)]
pub struct MockTransaction {
    conn: Weak<ConnShared>,
    isolation_level: IsolationLevel,
    finished: bool,
}

impl MockTransaction {
    pub(crate) fn new(conn: Weak<ConnShared>, isolation_level: IsolationLevel) -> Self {
        Self {
            conn,
            isolation_level,
            finished: false,
        }
    }

    /// Isolation level requested at `begin`.
    #[must_use]
    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    fn finish(&mut self, outcome: &'static str) -> Result<()> {
        self.finished = true;
        let conn = self.conn.upgrade().ok_or(Error::ConnectionClosed)?;
        conn.end_transaction()?;
        tracing::debug!(outcome, "transaction finished");
        Ok(())
    }

    /// Commit the transaction.
    pub fn commit(mut self) -> Result<()> {
        self.finish("commit")
    }

    /// Roll the transaction back.
    pub fn rollback(mut self) -> Result<()> {
        self.finish("rollback")
    }
}

impl Transaction for MockTransaction {
    fn commit(self: Box<Self>) -> Result<()> {
        MockTransaction::commit(*self)
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        MockTransaction::rollback(*self)
    }
}

impl Drop for MockTransaction {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.finish("rollback on drop");
        }
    }
}
