//! # sqlmock-types
//!
//! Value domain shared by the sqlmock matching engine and simulated driver.
//!
//! Bound statement arguments, expected mock arguments and canned reply cells
//! are all [`SqlValue`]s. This crate also defines the equality contract used
//! when a mock declares expected arguments (see [`SqlValue::arg_eq`]).
//!
//! ## Features
//!
//! - `chrono` (default): date/time values via chrono
//! - `uuid` (default): UUID values
//! - `decimal` (default): decimal values via rust_decimal
//! - `json`: JSON values via serde_json
//!
//! ## Argument Equality
//!
//! | Left | Right | Equal when |
//! |------|-------|------------|
//! | any integer width | any integer width | same numeric value |
//! | `Float` / `Double` | `Float` / `Double` | same value after widening to `f64` (NaN never equal) |
//! | `String` | `String` | byte-exact |
//! | `Binary` | `Binary` | byte-exact |
//! | date/time | same date/time variant | same instant |
//! | `Null` | `Null` | always |
//!
//! Every other pairing is unequal; in particular integers never equal floats
//! and strings never equal binary payloads.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod from_sql;
pub mod to_sql;
pub mod value;

pub use error::TypeError;
pub use from_sql::FromSql;
pub use to_sql::ToSql;
pub use value::{SqlValue, args_match};
