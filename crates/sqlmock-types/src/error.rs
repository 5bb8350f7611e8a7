//! Type conversion error types.

use thiserror::Error;

/// Errors that can occur while converting between Rust types and [`SqlValue`].
///
/// [`SqlValue`]: crate::SqlValue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Value is null when non-null was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name or description.
        actual: String,
    },

    /// Value is out of range for target type.
    #[error("value out of range for {target_type}")]
    OutOfRange {
        /// Target type name.
        target_type: &'static str,
    },

    /// Invalid UUID value.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// Invalid decimal value.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    /// Column index or name does not exist in the row.
    #[error("no such column: {0}")]
    NoSuchColumn(String),
}
