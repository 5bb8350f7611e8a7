//! Driver contract implemented by the mock.
//!
//! A host database layer talks to drivers only through these traits. Optional
//! operations are advertised through [`Capabilities`] instead of being
//! discovered by probing, and the provided defaults return
//! [`Error::NotSupported`] so a caller that ignores the flags still gets a
//! well-defined answer.

use std::time::Instant;

use bitflags::bitflags;
use sqlmock_types::SqlValue;

use crate::error::{Error, Result};

bitflags! {
    /// Optional operations a connection and its statements/cursors expose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// `Statement::exec_context` / `Statement::query_context`.
        const CONTEXT_EXECUTE = 0x0001;
        /// `Connection::prepare_context`.
        const CONTEXT_PREPARE = 0x0002;
        /// `Rows::has_next_result_set` / `Rows::next_result_set`.
        const MULTI_RESULT_SETS = 0x0004;
        /// `Rows::column_scan_type`.
        const COLUMN_SCAN_TYPE = 0x0008;
        /// `Connection::begin`.
        const TRANSACTIONS = 0x0010;
    }
}

/// Cancellation and deadline token passed along with each call.
///
/// The mock never blocks, so the token is accepted and ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context with no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context carrying a deadline.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Outcome of advancing a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Advance {
    /// The destination buffer now holds the next row.
    Row,
    /// No more rows in the current result set.
    Exhausted,
}

impl Advance {
    /// Check if a row was produced.
    pub fn is_row(self) -> bool {
        matches!(self, Self::Row)
    }
}

/// A database driver: a factory for connections.
pub trait Driver: Send + Sync {
    /// Open a connection to the named data source.
    fn open(&self, dsn: &str) -> Result<Box<dyn Connection>>;
}

/// A single logical session.
pub trait Connection: Send {
    /// Optional operations this connection supports.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Prepare a statement for execution.
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Statement>>;

    /// Prepare a statement with a background context.
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Statement>> {
        self.prepare_context(&Context::background(), query)
    }

    /// Start a transaction.
    fn begin(&mut self) -> Result<Box<dyn Transaction>> {
        Err(Error::NotSupported("begin"))
    }

    /// Execute a write directly without preparing.
    ///
    /// Returning [`Error::Skip`] tells the caller to prepare instead.
    fn exec_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        _args: &[SqlValue],
    ) -> Result<Box<dyn ExecResult>> {
        Err(Error::Skip)
    }

    /// Execute a read directly without preparing.
    ///
    /// Returning [`Error::Skip`] tells the caller to prepare instead.
    fn query_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        _args: &[SqlValue],
    ) -> Result<Box<dyn Rows>> {
        Err(Error::Skip)
    }

    /// Close the connection.
    fn close(&mut self) -> Result<()>;
}

/// A prepared statement bound to one connection.
pub trait Statement: Send {
    /// Number of placeholders, or `None` if unknown.
    fn num_input(&self) -> Option<usize>;

    /// Execute as a write.
    fn exec_context(&mut self, ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn ExecResult>>;

    /// Execute as a read.
    fn query_context(&mut self, ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn Rows>>;

    /// Legacy write entry point without a context.
    ///
    /// # Panics
    ///
    /// Always. A host layer that reaches this is miswired.
    #[allow(clippy::panic)]
    fn exec(&mut self, _args: &[SqlValue]) -> Result<Box<dyn ExecResult>> {
        panic!("Statement::exec is not supported, call exec_context");
    }

    /// Legacy read entry point without a context.
    ///
    /// # Panics
    ///
    /// Always. A host layer that reaches this is miswired.
    #[allow(clippy::panic)]
    fn query(&mut self, _args: &[SqlValue]) -> Result<Box<dyn Rows>> {
        panic!("Statement::query is not supported, call query_context");
    }

    /// Close the statement.
    fn close(&mut self) -> Result<()>;
}

/// Forward-only cursor over one or more result sets.
pub trait Rows: Send {
    /// Column names of the current result set.
    fn columns(&self) -> Vec<String>;

    /// Copy the next row into `dest`.
    ///
    /// `dest` must have at least as many slots as [`Rows::columns`].
    fn next(&mut self, dest: &mut [SqlValue]) -> Result<Advance>;

    /// Scan type name of a column in the current result set.
    fn column_scan_type(&self, _index: usize) -> Result<&'static str> {
        Err(Error::NotSupported("column_scan_type"))
    }

    /// Check if another result set follows the current one.
    fn has_next_result_set(&self) -> bool {
        false
    }

    /// Move to the next result set.
    ///
    /// Returns `Ok(false)` when there is none.
    fn next_result_set(&mut self) -> Result<bool> {
        Err(Error::NotSupported("next_result_set"))
    }

    /// Close the cursor.
    fn close(&mut self) -> Result<()>;
}

/// Outcome of a write.
pub trait ExecResult: Send {
    /// Id generated by the write.
    fn last_insert_id(&self) -> Result<i64>;

    /// Number of rows the write affected.
    fn rows_affected(&self) -> Result<i64>;
}

/// An open transaction.
pub trait Transaction: Send {
    /// Commit the transaction.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Roll the transaction back.
    fn rollback(self: Box<Self>) -> Result<()>;
}
