//! Trait for converting from SQL values to Rust types.

use crate::error::TypeError;
use crate::value::SqlValue;

/// Types that can be read out of a cursor cell.
pub trait FromSql: Sized {
    /// Convert from a SQL value to this type.
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError>;

    /// Convert from an optional SQL value, mapping NULL to `None`.
    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

fn mismatch(expected: &'static str, value: &SqlValue) -> TypeError {
    match value {
        SqlValue::Null => TypeError::UnexpectedNull,
        other => TypeError::TypeMismatch {
            expected,
            actual: other.type_name().to_string(),
        },
    }
}

impl FromSql for bool {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Bool(v) => Ok(*v),
            other => other.as_i64().map(|v| v != 0).ok_or_else(|| mismatch("bool", other)),
        }
    }
}

impl FromSql for i32 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        let wide = value.as_i64().ok_or_else(|| mismatch("i32", value))?;
        i32::try_from(wide).map_err(|_| TypeError::OutOfRange { target_type: "i32" })
    }
}

impl FromSql for i64 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        value.as_i64().ok_or_else(|| mismatch("i64", value))
    }
}

impl FromSql for f64 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromSql for String {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::String(v) => Ok(v.clone()),
            other => Err(mismatch("String", other)),
        }
    }
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Binary(v) => Ok(v.to_vec()),
            other => Err(mismatch("Vec<u8>", other)),
        }
    }
}

impl FromSql for bytes::Bytes {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Binary(v) => Ok(v.clone()),
            other => Err(mismatch("Bytes", other)),
        }
    }
}

impl FromSql for SqlValue {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        T::from_sql_nullable(value)
    }
}

#[cfg(feature = "uuid")]
impl FromSql for uuid::Uuid {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Uuid(v) => Ok(*v),
            SqlValue::String(s) => s.parse().map_err(|e| TypeError::InvalidUuid(format!("{e}"))),
            other => Err(mismatch("Uuid", other)),
        }
    }
}

#[cfg(feature = "decimal")]
impl FromSql for rust_decimal::Decimal {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Decimal(v) => Ok(*v),
            SqlValue::String(s) => s
                .parse()
                .map_err(|e| TypeError::InvalidDecimal(format!("{e}"))),
            other => other
                .as_i64()
                .map(rust_decimal::Decimal::from)
                .ok_or_else(|| mismatch("Decimal", other)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDate {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Date(v) => Ok(*v),
            SqlValue::DateTime(v) => Ok(v.date()),
            other => Err(mismatch("NaiveDate", other)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Time(v) => Ok(*v),
            SqlValue::DateTime(v) => Ok(v.time()),
            other => Err(mismatch("NaiveTime", other)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDateTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::DateTime(v) => Ok(*v),
            SqlValue::DateTimeOffset(v) => Ok(v.naive_utc()),
            other => Err(mismatch("NaiveDateTime", other)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::DateTime<chrono::FixedOffset> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::DateTimeOffset(v) => Ok(*v),
            other => Err(mismatch("DateTime<FixedOffset>", other)),
        }
    }
}

#[cfg(feature = "json")]
impl FromSql for serde_json::Value {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Json(v) => Ok(v.clone()),
            SqlValue::String(s) => serde_json::from_str(s).map_err(|e| TypeError::TypeMismatch {
                expected: "JSON",
                actual: format!("invalid JSON: {e}"),
            }),
            SqlValue::Null => Ok(serde_json::Value::Null),
            other => Err(mismatch("JSON", other)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sql_widening() {
        assert_eq!(i64::from_sql(&SqlValue::TinyInt(4)).unwrap(), 4);
        assert_eq!(f64::from_sql(&SqlValue::Float(0.5)).unwrap(), 0.5);
    }

    #[test]
    fn test_from_sql_narrowing_out_of_range() {
        let err = i32::from_sql(&SqlValue::BigInt(i64::MAX)).unwrap_err();
        assert_eq!(err, TypeError::OutOfRange { target_type: "i32" });
    }

    #[test]
    fn test_from_sql_null() {
        assert_eq!(
            String::from_sql(&SqlValue::Null).unwrap_err(),
            TypeError::UnexpectedNull
        );
        assert_eq!(Option::<String>::from_sql(&SqlValue::Null).unwrap(), None);
    }

    #[test]
    fn test_from_sql_mismatch() {
        let err = String::from_sql(&SqlValue::Int(1)).unwrap_err();
        assert!(matches!(err, TypeError::TypeMismatch { expected: "String", .. }));
    }
}
