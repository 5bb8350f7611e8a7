//! Row cursor over canned result sets.
//!
//! A [`RowCursor`] is built from the result sets of a matched mock. Each
//! result set carries its own column metadata: the union of the keys of its
//! rows in first-seen order, typed by the first non-null value in each
//! column. Rows missing a key read as NULL.
//!
//! Binary cells are handed out as immutable shared buffers, so values read
//! before close stay valid after it and callers cannot alter the canned rows.

use std::sync::Arc;

use sqlmock_types::{FromSql, SqlValue, TypeError};

use crate::api::{Advance, Rows};
use crate::error::{Error, Result};
use crate::response::{MockResponse, ReplyRow};

/// Column metadata describing a result set column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column index (0-based).
    pub index: usize,
    /// Scan type name (e.g., "INT", "VARCHAR"), "NULL" when unknown.
    pub type_name: &'static str,
    /// Whether any row holds NULL (or lacks the column).
    pub nullable: bool,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, index: usize, type_name: &'static str) -> Self {
        Self {
            name: name.into(),
            index,
            type_name,
            nullable: false,
        }
    }

    /// Set whether the column is nullable.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Column metadata shared by every row of one result set.
#[derive(Debug, Clone, Default)]
pub struct ColMetaData {
    /// Column definitions.
    pub columns: Arc<[Column]>,
}

impl ColMetaData {
    /// Create new column metadata from a list of columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns: columns.into(),
        }
    }

    /// Get the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get a column by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Find a column index by name (case-insensitive).
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// An owned row read from a cursor.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<SqlValue>,
    metadata: Arc<ColMetaData>,
}

impl Row {
    /// Create a row from values and shared metadata.
    pub fn from_values(values: Vec<SqlValue>, metadata: Arc<ColMetaData>) -> Self {
        Self { values, metadata }
    }

    /// Get a value by column index.
    pub fn get<T: FromSql>(&self, index: usize) -> std::result::Result<T, TypeError> {
        self.values
            .get(index)
            .ok_or_else(|| TypeError::NoSuchColumn(format!("index {index}")))
            .and_then(T::from_sql)
    }

    /// Get a value by column name (case-insensitive).
    pub fn get_by_name<T: FromSql>(&self, name: &str) -> std::result::Result<T, TypeError> {
        let index = self
            .metadata
            .find_by_name(name)
            .ok_or_else(|| TypeError::NoSuchColumn(name.to_owned()))?;
        self.get(index)
    }

    /// Get a value by index, `None` if NULL, missing, or not convertible.
    pub fn try_get<T: FromSql>(&self, index: usize) -> Option<T> {
        self.values
            .get(index)
            .and_then(|v| T::from_sql_nullable(v).ok().flatten())
    }

    /// Get a value by name, `None` if NULL, missing, or not convertible.
    pub fn try_get_by_name<T: FromSql>(&self, name: &str) -> Option<T> {
        let index = self.metadata.find_by_name(name)?;
        self.try_get(index)
    }

    /// Raw value by index.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Check if the value at `index` is NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(SqlValue::is_null)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.metadata.columns
    }

    /// All values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Consume the row, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

#[derive(Debug, Clone, Default)]
struct ResultSet {
    metadata: Arc<ColMetaData>,
    rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    fn from_reply(reply: &[ReplyRow]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        for row in reply {
            for name in row.columns() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let rows: Vec<Vec<SqlValue>> = reply
            .iter()
            .map(|row| {
                names
                    .iter()
                    .map(|name| row.get(name).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        let columns = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let mut cells = rows.iter().map(|row| &row[index]);
                let type_name = cells
                    .clone()
                    .find(|v| !v.is_null())
                    .map_or("NULL", SqlValue::type_name);
                let nullable = cells.any(SqlValue::is_null);
                Column::new(*name, index, type_name).with_nullable(nullable)
            })
            .collect();

        Self {
            metadata: Arc::new(ColMetaData::new(columns)),
            rows,
        }
    }
}

/// Forward-only cursor over the result sets of one read.
#[derive(Debug)]
pub struct RowCursor {
    sets: Vec<ResultSet>,
    pos_set: usize,
    pos_row: Option<usize>,
    fault: Option<(usize, Error)>,
    closed: bool,
}

impl RowCursor {
    /// Build a cursor from the result sets of a response.
    #[must_use]
    pub fn from_response(spec: &MockResponse) -> Self {
        Self {
            sets: spec
                .result_sets()
                .iter()
                .map(|reply| ResultSet::from_reply(reply))
                .collect(),
            pos_set: 0,
            pos_row: None,
            fault: spec.row_error.clone(),
            closed: false,
        }
    }

    /// Build a single-set cursor from rows.
    #[must_use]
    pub fn from_rows(rows: &[ReplyRow]) -> Self {
        Self::from_response(&MockResponse::new().with_reply(rows.iter().cloned()))
    }

    fn current(&self) -> Option<&ResultSet> {
        self.sets.get(self.pos_set)
    }

    /// Column metadata of the current result set.
    #[must_use]
    pub fn metadata(&self) -> Arc<ColMetaData> {
        self.current()
            .map(|set| Arc::clone(&set.metadata))
            .unwrap_or_default()
    }

    /// Column names of the current result set.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.current()
            .map(|set| set.metadata.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of result sets.
    #[must_use]
    pub fn result_set_count(&self) -> usize {
        self.sets.len()
    }

    /// Check if the cursor is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Scan type of a column in the current result set.
    pub fn scan_type(&self, index: usize) -> Result<&'static str> {
        self.current()
            .and_then(|set| set.metadata.get(index))
            .map(|column| column.type_name)
            .ok_or_else(|| TypeError::NoSuchColumn(format!("index {index}")).into())
    }

    /// Advance to the next row, copying its values into `dest`.
    ///
    /// Extra columns beyond `dest.len()` are not copied. An injected row
    /// error fires in place of the row at its position; positions past the
    /// end of the result set never fire.
    pub fn advance(&mut self, dest: &mut [SqlValue]) -> Result<Advance> {
        if self.closed {
            return Err(Error::CursorClosed);
        }

        let row = self.pos_row.map_or(0, |r| r.saturating_add(1));
        self.pos_row = Some(row);

        let Some(cells) = self.current().and_then(|set| set.rows.get(row)) else {
            return Ok(Advance::Exhausted);
        };

        if let Some((position, err)) = &self.fault {
            if *position == row {
                tracing::trace!(row, "injected row error");
                return Err(err.clone());
            }
        }

        if dest.len() < cells.len() {
            tracing::warn!(
                columns = cells.len(),
                slots = dest.len(),
                "destination shorter than row"
            );
        }
        for (slot, cell) in dest.iter_mut().zip(cells) {
            slot.clone_from(cell);
        }

        tracing::trace!(set = self.pos_set, row, "advanced cursor");
        Ok(Advance::Row)
    }

    /// Advance and return the row as an owned [`Row`], `None` when exhausted.
    pub fn fetch(&mut self) -> Result<Option<Row>> {
        let metadata = self.metadata();
        let mut values = vec![SqlValue::Null; metadata.len()];
        match self.advance(&mut values)? {
            Advance::Row => Ok(Some(Row::from_values(values, metadata))),
            Advance::Exhausted => Ok(None),
        }
    }

    /// Read every remaining row of the current result set.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Check if a further result set follows the current one.
    #[must_use]
    pub fn has_next_set(&self) -> bool {
        self.pos_set + 1 < self.sets.len()
    }

    /// Move to the next result set, rewinding to before its first row.
    ///
    /// Returns `false` when there is none.
    pub fn next_set(&mut self) -> Result<bool> {
        if self.closed {
            return Err(Error::CursorClosed);
        }
        if !self.has_next_set() {
            return Ok(false);
        }
        self.pos_set += 1;
        self.pos_row = None;
        Ok(true)
    }

    /// Close the cursor and release its rows.
    ///
    /// Closing an already closed cursor does nothing.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.sets.clear();
        self.closed = true;
        tracing::trace!("cursor closed");
    }
}

impl Rows for RowCursor {
    fn columns(&self) -> Vec<String> {
        self.column_names()
    }

    fn next(&mut self, dest: &mut [SqlValue]) -> Result<Advance> {
        self.advance(dest)
    }

    fn column_scan_type(&self, index: usize) -> Result<&'static str> {
        self.scan_type(index)
    }

    fn has_next_result_set(&self) -> bool {
        self.has_next_set()
    }

    fn next_result_set(&mut self) -> Result<bool> {
        self.next_set()
    }

    fn close(&mut self) -> Result<()> {
        self.shutdown();
        Ok(())
    }
}
