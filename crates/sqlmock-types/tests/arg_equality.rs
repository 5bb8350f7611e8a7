//! Argument equality contract tests.
//!
//! The contract decides whether a mock with expected arguments matches the
//! arguments bound at execution time, so its edge cases are pinned here.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use sqlmock_types::{SqlValue, ToSql, args_match};

mod integers {
    use super::*;

    proptest! {
        #[test]
        fn int_and_bigint_agree(v in any::<i32>()) {
            prop_assert!(SqlValue::Int(v).arg_eq(&SqlValue::BigInt(i64::from(v))));
            prop_assert!(SqlValue::BigInt(i64::from(v)).arg_eq(&SqlValue::Int(v)));
        }

        #[test]
        fn distinct_values_never_match(a in any::<i64>(), b in any::<i64>()) {
            prop_assume!(a != b);
            prop_assert!(!SqlValue::BigInt(a).arg_eq(&SqlValue::BigInt(b)));
        }
    }
}

mod symmetry {
    use super::*;

    fn scalar() -> impl Strategy<Value = SqlValue> {
        prop_oneof![
            Just(SqlValue::Null),
            any::<bool>().prop_map(SqlValue::Bool),
            any::<i16>().prop_map(SqlValue::SmallInt),
            any::<i32>().prop_map(SqlValue::Int),
            any::<i64>().prop_map(SqlValue::BigInt),
            any::<f64>().prop_map(SqlValue::Double),
            ".{0,12}".prop_map(SqlValue::String),
            proptest::collection::vec(any::<u8>(), 0..16).prop_map(SqlValue::from),
        ]
    }

    proptest! {
        #[test]
        fn arg_eq_is_symmetric(a in scalar(), b in scalar()) {
            prop_assert_eq!(a.arg_eq(&b), b.arg_eq(&a));
        }

        #[test]
        fn arg_eq_is_reflexive_except_nan(a in scalar()) {
            let is_nan = matches!(a, SqlValue::Double(v) if v.is_nan());
            prop_assert_eq!(a.arg_eq(&a), !is_nan);
        }
    }
}

#[test]
fn test_bound_args_from_to_sql_match_expected_values() {
    let expected = vec![SqlValue::from(27), SqlValue::from("alice")];
    let bound: Vec<SqlValue> = [&27i64 as &dyn ToSql, &"alice"]
        .iter()
        .map(|a| a.to_sql().unwrap())
        .collect();

    assert!(args_match(&expected, &bound));
}

#[test]
fn test_trailing_extra_argument_breaks_match() {
    let expected = vec![SqlValue::from(27)];
    let bound = vec![SqlValue::from(27), SqlValue::from("x")];
    assert!(!args_match(&expected, &bound));
}

#[test]
fn test_binary_is_byte_exact() {
    let a = SqlValue::from(vec![0u8, 1, 2]);
    assert!(a.arg_eq(&SqlValue::from(&[0u8, 1, 2][..])));
    assert!(!a.arg_eq(&SqlValue::from(vec![0u8, 1])));
}

#[test]
fn test_string_is_case_sensitive() {
    assert!(!SqlValue::from("Alice").arg_eq(&SqlValue::from("alice")));
}

#[cfg(feature = "uuid")]
#[test]
fn test_uuid_compares_by_value() {
    use sqlmock_types::FromSql;

    let id = uuid::Uuid::from_u128(0x6f1c_2a3b_4d5e_4f60_8a7b_9c0d_1e2f_3a4b);
    let parsed = uuid::Uuid::from_sql(&SqlValue::from(id.to_string())).unwrap();
    assert_eq!(parsed, id);

    assert!(SqlValue::from(id).arg_eq(&SqlValue::Uuid(parsed)));
    assert!(!SqlValue::from(id).arg_eq(&SqlValue::from(id.to_string())));
    assert!(!SqlValue::from(id).arg_eq(&SqlValue::Uuid(uuid::Uuid::nil())));
}
