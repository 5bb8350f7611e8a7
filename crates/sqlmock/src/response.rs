//! Mock response specifications.
//!
//! A [`MockResponse`] describes one mock: what statement it matches and what
//! the statement returns. It is a plain by-value builder, suitable for
//! factories and for [`MockCatcher::attach`](crate::MockCatcher::attach).
//!
//! Once registered, a specification is reached through a [`Mock`] handle.
//! Handles share the specification with the catcher, so builder calls on a
//! handle are visible to later matching and `triggered` can be observed
//! after the fact.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use sqlmock_types::{SqlValue, args_match};

use crate::error::Error;

/// Side-effect invoked with the statement text and bound arguments.
pub type Callback = Arc<dyn Fn(&str, &[SqlValue]) + Send + Sync>;

/// Predicate deciding whether to simulate a broken connection.
pub type ExceptionHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// One canned result row: column names mapped to values, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyRow {
    cells: Vec<(String, SqlValue)>,
}

impl ReplyRow {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cell, returning the row.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a cell. An existing column keeps its position and takes the new value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Look up a cell by exact column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Cells in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ReplyRow
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ReplyRow
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from(cells: [(K, V); N]) -> Self {
        cells.into_iter().collect()
    }
}

/// Description of one mock.
#[derive(Clone, Default)]
pub struct MockResponse {
    pub(crate) pattern: String,
    pub(crate) strict: bool,
    pub(crate) args: Option<Vec<SqlValue>>,
    pub(crate) result_sets: Vec<Vec<ReplyRow>>,
    pub(crate) once: bool,
    pub(crate) triggered: bool,
    pub(crate) rows_affected: i64,
    pub(crate) last_insert_id: i64,
    pub(crate) error: Option<Error>,
    pub(crate) query_exception: Option<ExceptionHook>,
    pub(crate) exec_exception: Option<ExceptionHook>,
    pub(crate) callback: Option<Callback>,
    pub(crate) row_error: Option<(usize, Error)>,
}

impl MockResponse {
    /// Create an empty specification. It matches every statement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match statements containing `pattern`, or equal to it in strict mode.
    #[must_use]
    pub fn with_query(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Require the statement text to equal the pattern exactly.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Only match when the bound arguments equal `args`, in order.
    #[must_use]
    pub fn with_args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Rows of the first result set.
    #[must_use]
    pub fn with_reply<I, R>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReplyRow>,
    {
        self.set_reply(rows.into_iter().map(Into::into).collect());
        self
    }

    /// Append a further result set.
    #[must_use]
    pub fn with_next_reply<I, R>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReplyRow>,
    {
        self.push_reply(rows.into_iter().map(Into::into).collect());
        self
    }

    /// Match at most once.
    #[must_use]
    pub fn one_time(mut self) -> Self {
        self.once = true;
        self
    }

    /// Invoke `callback` with the statement and arguments whenever selected.
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &[SqlValue]) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Affected-row count reported for writes.
    #[must_use]
    pub fn with_rows_num(mut self, rows: i64) -> Self {
        self.rows_affected = rows;
        self
    }

    /// Generated id reported for writes.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.last_insert_id = id;
        self
    }

    /// Fail execution with `err`, returned verbatim as [`Error::Mocked`].
    #[must_use]
    pub fn with_error<E>(mut self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.error = Some(Error::mocked(err));
        self
    }

    /// Fail execution with a driver error.
    #[must_use]
    pub fn with_driver_error(mut self, err: Error) -> Self {
        self.error = Some(err);
        self
    }

    /// Reads fail with [`Error::BadConnection`].
    #[must_use]
    pub fn with_query_exception(self) -> Self {
        self.with_query_exception_hook(|| true)
    }

    /// Writes fail with [`Error::BadConnection`].
    #[must_use]
    pub fn with_exec_exception(self) -> Self {
        self.with_exec_exception_hook(|| true)
    }

    /// Reads fail with [`Error::BadConnection`] whenever `hook` returns true.
    #[must_use]
    pub fn with_query_exception_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.query_exception = Some(Arc::new(hook));
        self
    }

    /// Writes fail with [`Error::BadConnection`] whenever `hook` returns true.
    #[must_use]
    pub fn with_exec_exception_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.exec_exception = Some(Arc::new(hook));
        self
    }

    /// Make the cursor fail with `err` when it reaches row `position` (0-based)
    /// of any result set, instead of yielding that row.
    ///
    /// A result set with no row at `position` is unaffected; the error never
    /// follows end of data.
    #[must_use]
    pub fn with_row_error<E>(mut self, position: usize, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.row_error = Some((position, Error::mocked(err)));
        self
    }

    /// Pattern matched against statement text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if the pattern must equal the statement exactly.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Expected arguments, if any.
    #[must_use]
    pub fn args(&self) -> Option<&[SqlValue]> {
        self.args.as_deref()
    }

    /// Rows of the first result set.
    #[must_use]
    pub fn reply(&self) -> &[ReplyRow] {
        self.result_sets.first().map_or(&[], Vec::as_slice)
    }

    /// All result sets.
    #[must_use]
    pub fn result_sets(&self) -> &[Vec<ReplyRow>] {
        &self.result_sets
    }

    /// Check if the mock matches at most once.
    #[must_use]
    pub fn is_once(&self) -> bool {
        self.once
    }

    /// Check if the mock has been selected at least once.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Affected-row count reported for writes.
    #[must_use]
    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }

    /// Generated id reported for writes.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    /// Configured execution error.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Check if this specification applies to `query` bound with `args`.
    ///
    /// An exhausted one-time mock never matches. An empty pattern matches
    /// everything; otherwise strict mode compares for equality and default
    /// mode for containment. Arguments are compared only when expected.
    #[must_use]
    pub fn is_match(&self, query: &str, args: &[SqlValue]) -> bool {
        if self.once && self.triggered {
            return false;
        }

        let pattern_matches = self.pattern.is_empty()
            || if self.strict {
                query == self.pattern
            } else {
                query.contains(self.pattern.as_str())
            };

        pattern_matches
            && self
                .args
                .as_deref()
                .is_none_or(|expected| args_match(expected, args))
    }

    fn set_reply(&mut self, rows: Vec<ReplyRow>) {
        match self.result_sets.first_mut() {
            Some(first) => *first = rows,
            None => self.result_sets.push(rows),
        }
    }

    fn push_reply(&mut self, rows: Vec<ReplyRow>) {
        if self.result_sets.is_empty() {
            self.result_sets.push(Vec::new());
        }
        self.result_sets.push(rows);
    }

    pub(crate) fn run_callback(&self, query: &str, args: &[SqlValue]) {
        if let Some(callback) = &self.callback {
            callback(query, args);
        }
    }

    pub(crate) fn query_fault(&self) -> bool {
        self.query_exception.as_ref().is_some_and(|hook| hook())
    }

    pub(crate) fn exec_fault(&self) -> bool {
        self.exec_exception.as_ref().is_some_and(|hook| hook())
    }
}

impl fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockResponse")
            .field("pattern", &self.pattern)
            .field("strict", &self.strict)
            .field("args", &self.args)
            .field("result_sets", &self.result_sets.len())
            .field("once", &self.once)
            .field("triggered", &self.triggered)
            .field("rows_affected", &self.rows_affected)
            .field("last_insert_id", &self.last_insert_id)
            .field("error", &self.error)
            .field("query_exception", &self.query_exception.is_some())
            .field("exec_exception", &self.exec_exception.is_some())
            .field("callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Handle to a registered specification.
///
/// Cloning the handle shares the specification. Builder methods take the
/// handle by value so calls chain the same way as on [`MockResponse`]; each
/// call takes the specification's lock for the duration of the update.
#[derive(Clone, Default)]
pub struct Mock {
    pub(crate) inner: Arc<Mutex<MockResponse>>,
}

impl Mock {
    /// Apply `f` to the shared specification under its lock.
    ///
    /// Arguments are converted by the callers before the lock is taken, so
    /// `f` only assigns fields and a failed conversion leaves the
    /// specification untouched.
    fn update(self, f: impl FnOnce(&mut MockResponse)) -> Self {
        {
            let mut spec = self.inner.lock();
            f(&mut *spec);
        }
        self
    }

    /// See [`MockResponse::with_query`].
    #[must_use]
    pub fn with_query(self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.update(|spec| spec.pattern = pattern)
    }

    /// See [`MockResponse::strict`].
    #[must_use]
    pub fn strict(self) -> Self {
        self.update(|spec| spec.strict = true)
    }

    /// See [`MockResponse::with_args`].
    #[must_use]
    pub fn with_args<I, V>(self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let args = args.into_iter().map(Into::into).collect();
        self.update(|spec| spec.args = Some(args))
    }

    /// See [`MockResponse::with_reply`].
    #[must_use]
    pub fn with_reply<I, R>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReplyRow>,
    {
        let rows = rows.into_iter().map(Into::into).collect();
        self.update(|spec| spec.set_reply(rows))
    }

    /// See [`MockResponse::with_next_reply`].
    #[must_use]
    pub fn with_next_reply<I, R>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReplyRow>,
    {
        let rows = rows.into_iter().map(Into::into).collect();
        self.update(|spec| spec.push_reply(rows))
    }

    /// See [`MockResponse::one_time`].
    #[must_use]
    pub fn one_time(self) -> Self {
        self.update(|spec| spec.once = true)
    }

    /// See [`MockResponse::with_callback`].
    #[must_use]
    pub fn with_callback<F>(self, callback: F) -> Self
    where
        F: Fn(&str, &[SqlValue]) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.update(|spec| spec.callback = Some(callback))
    }

    /// See [`MockResponse::with_rows_num`].
    #[must_use]
    pub fn with_rows_num(self, rows: i64) -> Self {
        self.update(|spec| spec.rows_affected = rows)
    }

    /// See [`MockResponse::with_id`].
    #[must_use]
    pub fn with_id(self, id: i64) -> Self {
        self.update(|spec| spec.last_insert_id = id)
    }

    /// See [`MockResponse::with_error`].
    #[must_use]
    pub fn with_error<E>(self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.with_driver_error(Error::mocked(err))
    }

    /// See [`MockResponse::with_driver_error`].
    #[must_use]
    pub fn with_driver_error(self, err: Error) -> Self {
        self.update(|spec| spec.error = Some(err))
    }

    /// See [`MockResponse::with_query_exception`].
    #[must_use]
    pub fn with_query_exception(self) -> Self {
        self.with_query_exception_hook(|| true)
    }

    /// See [`MockResponse::with_exec_exception`].
    #[must_use]
    pub fn with_exec_exception(self) -> Self {
        self.with_exec_exception_hook(|| true)
    }

    /// See [`MockResponse::with_query_exception_hook`].
    #[must_use]
    pub fn with_query_exception_hook<F>(self, hook: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let hook: ExceptionHook = Arc::new(hook);
        self.update(|spec| spec.query_exception = Some(hook))
    }

    /// See [`MockResponse::with_exec_exception_hook`].
    #[must_use]
    pub fn with_exec_exception_hook<F>(self, hook: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let hook: ExceptionHook = Arc::new(hook);
        self.update(|spec| spec.exec_exception = Some(hook))
    }

    /// See [`MockResponse::with_row_error`].
    #[must_use]
    pub fn with_row_error<E>(self, position: usize, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let fault = (position, Error::mocked(err));
        self.update(|spec| spec.row_error = Some(fault))
    }

    /// Check if the mock has been selected at least once.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.inner.lock().triggered
    }

    /// Copy of the current specification.
    #[must_use]
    pub fn snapshot(&self) -> MockResponse {
        self.inner.lock().clone()
    }

    /// Check if two handles refer to the same registered specification.
    #[must_use]
    pub fn ptr_eq(&self, other: &Mock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<MockResponse> for Mock {
    fn from(spec: MockResponse) -> Self {
        Self {
            inner: Arc::new(Mutex::new(spec)),
        }
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mock").field(&*self.inner.lock()).finish()
    }
}
