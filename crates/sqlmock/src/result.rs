//! Result of a write.

use crate::api::ExecResult;
use crate::error::Result;

/// Outcome of a write: the generated id and affected-row count the matched
/// mock was configured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockResult {
    /// Id generated by the write.
    pub last_insert_id: i64,
    /// Number of rows the write affected.
    pub rows_affected: i64,
}

impl MockResult {
    /// Create a new result.
    pub fn new(last_insert_id: i64, rows_affected: i64) -> Self {
        Self {
            last_insert_id,
            rows_affected,
        }
    }
}

impl ExecResult for MockResult {
    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.last_insert_id)
    }

    fn rows_affected(&self) -> Result<i64> {
        Ok(self.rows_affected)
    }
}
