//! # sqlmock
//!
//! In-memory SQL driver test double. Statements issued through the driver
//! never reach a database; each one is matched against mocks registered on
//! a [`MockCatcher`] and answered with the canned rows, counters or error of
//! the first mock that applies.
//!
//! ## Features
//!
//! - **Ordered matching**: first registered eligible mock wins
//! - **Substring or strict patterns**, optional argument matching
//! - **One-time mocks** that are consumed atomically under concurrency
//! - **Fault injection**: verbatim errors, simulated broken connections,
//!   mid-stream cursor errors
//! - **Multiple result sets** and typed row access
//! - **Configurable unmatched behavior**: empty success, error, or panic
//!
//! ## Flow
//!
//! ```text
//! test registers mocks -> MockCatcher
//! app: Driver::open -> Connection::prepare -> Statement::query/exec
//!                                               |
//!                              MockCatcher::find_response
//!                                               |
//!                                   RowCursor or MockResult
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sqlmock::{Database, MockCatcher, ReplyRow};
//!
//! # fn main() -> sqlmock::Result<()> {
//! let catcher = MockCatcher::new();
//! catcher.register_as("doc-example");
//!
//! let _users = catcher
//!     .new_mock()
//!     .with_query("SELECT name FROM users WHERE age")
//!     .with_args([27])
//!     .with_reply([ReplyRow::new().with("name", "FirstLast")]);
//!
//! let mut db = Database::open("doc-example", "app")?;
//! let rows = db.query("SELECT name FROM users WHERE age=?", &[&27])?;
//! assert_eq!(rows.columns(), vec!["name"]);
//! # Ok(())
//! # }
//! ```
//!
//! The process-wide [`catcher()`] is configured from `SQLMOCK_LOGGING` and
//! `SQLMOCK_UNMATCHED` on first use and installs under [`DRIVER_NAME`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod catcher;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod response;
pub mod result;
pub mod rows;
pub mod sql;
pub mod statement;
pub mod transaction;

use once_cell::sync::Lazy;

pub use api::{
    Advance, Capabilities, Connection, Context, Driver, ExecResult, Rows, Statement, Transaction,
};
pub use catcher::{DRIVER_NAME, MockCatcher};
pub use config::{CatcherConfig, UnmatchedPolicy};
pub use connection::{ConnectionState, MockConnection};
pub use driver::{MockDatabase, MockDriver};
pub use error::{Error, Result};
pub use response::{Mock, MockResponse, ReplyRow};
pub use result::MockResult;
pub use rows::{ColMetaData, Column, Row, RowCursor};
pub use sql::Database;
pub use sqlmock_types::{FromSql, SqlValue, ToSql, TypeError, args_match};
pub use statement::{MockStatement, StatementKind, count_placeholders};
pub use transaction::{IsolationLevel, MockTransaction};

static DEFAULT_CATCHER: Lazy<MockCatcher> =
    Lazy::new(|| MockCatcher::with_config(CatcherConfig::from_env()));

/// The process-wide catcher.
///
/// Tests that run in parallel and share it must use distinct patterns, or
/// build their own [`MockCatcher`] instead.
#[must_use]
pub fn catcher() -> &'static MockCatcher {
    &DEFAULT_CATCHER
}

/// Install the process-wide catcher's driver under [`DRIVER_NAME`].
///
/// Repeated calls are no-ops.
pub fn register() {
    catcher().register();
}
