//! Prepared statements.
//!
//! Preparation inspects the statement text once: it counts placeholders and
//! takes the leading verb. Neither affects matching; the count is reported
//! through [`Statement::num_input`] and the verb is used for diagnostics.

use std::sync::Weak;

use once_cell::sync::Lazy;
use regex::Regex;
use sqlmock_types::SqlValue;

use crate::api::{Context, ExecResult, Rows, Statement};
use crate::catcher::MockCatcher;
use crate::connection::ConnShared;
use crate::error::{Error, Result};
use crate::response::MockResponse;
use crate::result::MockResult;
use crate::rows::RowCursor;

#[allow(clippy::expect_used)]
static NUMBERED_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\d+").expect("placeholder pattern is valid"));

/// Count placeholders in `query`.
///
/// Any `$N` marker switches the whole statement to numbered mode, where each
/// `$N` occurrence counts (a repeated `$1` counts twice). Otherwise every
/// `?` counts. Quoting is not considered.
#[must_use]
pub fn count_placeholders(query: &str) -> usize {
    let numbered = NUMBERED_PLACEHOLDER.find_iter(query).count();
    if numbered > 0 {
        numbered
    } else {
        query.matches('?').count()
    }
}

/// Kind of statement, from its leading verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// `SELECT`.
    Select,
    /// `INSERT`.
    Insert,
    /// `UPDATE`.
    Update,
    /// `DELETE`.
    Delete,
    /// Any other verb, uppercased. Empty for blank statements.
    Other(String),
}

impl StatementKind {
    /// Classify the first whitespace-delimited token of `query`.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let verb = query
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();
        match verb.as_str() {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Other(verb),
        }
    }

    /// The uppercased verb.
    #[must_use]
    pub fn verb(&self) -> &str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Other(verb) => verb,
        }
    }

    /// Check if the generated id is conventionally meaningful.
    #[must_use]
    pub fn reports_generated_id(&self) -> bool {
        matches!(self, Self::Insert)
    }

    /// Check if the affected-row count is conventionally meaningful.
    #[must_use]
    pub fn reports_affected_rows(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

/// A statement prepared on a [`MockConnection`](crate::MockConnection).
#[derive(Debug)]
pub struct MockStatement {
    query: String,
    kind: StatementKind,
    placeholders: usize,
    conn: Weak<ConnShared>,
    catcher: MockCatcher,
    closed: bool,
}

impl MockStatement {
    pub(crate) fn new(query: &str, conn: Weak<ConnShared>, catcher: MockCatcher) -> Self {
        let kind = StatementKind::parse(query);
        let placeholders = count_placeholders(query);
        tracing::trace!(verb = kind.verb(), placeholders, "prepared statement");
        Self {
            query: query.to_owned(),
            kind,
            placeholders,
            conn,
            catcher,
            closed: false,
        }
    }

    /// Statement text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Kind parsed from the leading verb.
    #[must_use]
    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    /// The uppercased leading verb.
    #[must_use]
    pub fn verb(&self) -> &str {
        self.kind.verb()
    }

    /// Number of placeholders found at preparation.
    #[must_use]
    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::StatementClosed);
        }
        match self.conn.upgrade() {
            Some(conn) if !conn.is_closed() => Ok(()),
            _ => Err(Error::ConnectionClosed),
        }
    }

    /// Resolve the response, then apply the callback and configured error.
    fn respond(&self, args: &[SqlValue]) -> Result<MockResponse> {
        self.ensure_open()?;
        let spec = self.catcher.find_response(&self.query, args)?;
        spec.run_callback(&self.query, args);
        if let Some(err) = spec.error() {
            return Err(err.clone());
        }
        Ok(spec)
    }

    /// Execute as a write.
    pub fn execute_write(&self, args: &[SqlValue]) -> Result<MockResult> {
        let spec = self.respond(args)?;
        if spec.exec_fault() {
            return Err(Error::BadConnection);
        }
        tracing::trace!(
            verb = self.verb(),
            last_insert_id = spec.last_insert_id(),
            rows_affected = spec.rows_affected(),
            "write executed"
        );
        Ok(MockResult::new(spec.last_insert_id(), spec.rows_affected()))
    }

    /// Execute as a read.
    pub fn execute_read(&self, args: &[SqlValue]) -> Result<RowCursor> {
        let spec = self.respond(args)?;
        if spec.query_fault() {
            return Err(Error::BadConnection);
        }
        tracing::trace!(verb = self.verb(), sets = spec.result_sets().len(), "read executed");
        Ok(RowCursor::from_response(&spec))
    }
}

impl Statement for MockStatement {
    fn num_input(&self) -> Option<usize> {
        Some(self.placeholders)
    }

    fn exec_context(&mut self, _ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn ExecResult>> {
        Ok(Box::new(self.execute_write(args)?))
    }

    fn query_context(&mut self, _ctx: &Context, args: &[SqlValue]) -> Result<Box<dyn Rows>> {
        Ok(Box::new(self.execute_read(args)?))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
