//! Host-side driver table and a single-connection database handle.
//!
//! This is the thin slice of a database layer the mock plugs into: drivers
//! are registered by name, connections are opened by driver name and DSN,
//! and [`Database`] converts Rust arguments and drives the prepare/execute
//! protocol the way a host layer would. There is no pooling and no retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use sqlmock_types::{SqlValue, ToSql};

use crate::api::{Connection, Context, Driver, ExecResult, Rows, Statement, Transaction};
use crate::error::{Error, Result};

static DRIVERS: Lazy<RwLock<BTreeMap<String, Arc<dyn Driver>>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// Make a driver available under `name`.
///
/// Fails with [`Error::Registration`] if the name is taken.
pub fn register(name: &str, driver: Arc<dyn Driver>) -> Result<()> {
    if register_if_absent(name, driver) {
        Ok(())
    } else {
        Err(Error::Registration(format!(
            "register called twice for driver {name}"
        )))
    }
}

/// Make a driver available under `name` unless the name is taken.
///
/// Returns `true` if the driver was installed.
pub fn register_if_absent(name: &str, driver: Arc<dyn Driver>) -> bool {
    let mut drivers = DRIVERS.write();
    if drivers.contains_key(name) {
        return false;
    }
    drivers.insert(name.to_owned(), driver);
    true
}

/// Sorted names of the registered drivers.
#[must_use]
pub fn drivers() -> Vec<String> {
    DRIVERS.read().keys().cloned().collect()
}

/// The driver registered under `name`.
#[must_use]
pub fn driver(name: &str) -> Option<Arc<dyn Driver>> {
    DRIVERS.read().get(name).cloned()
}

/// Open a connection through the driver registered under `name`.
pub fn open(name: &str, dsn: &str) -> Result<Box<dyn Connection>> {
    let driver = driver(name).ok_or_else(|| Error::UnknownDriver(name.to_owned()))?;
    driver.open(dsn)
}

/// Convert bound arguments to values.
pub fn bind(args: &[&dyn ToSql]) -> Result<Vec<SqlValue>> {
    args.iter()
        .map(|arg| arg.to_sql().map_err(Error::from))
        .collect()
}

/// A single connection opened through the driver table.
pub struct Database {
    conn: Box<dyn Connection>,
    ctx: Context,
}

impl Database {
    /// Open `dsn` through the driver registered as `driver_name`.
    pub fn open(driver_name: &str, dsn: &str) -> Result<Self> {
        Ok(Self::from_connection(open(driver_name, dsn)?))
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Box<dyn Connection>) -> Self {
        Self {
            conn,
            ctx: Context::background(),
        }
    }

    /// Context passed with every call.
    #[must_use]
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Run a read.
    ///
    /// Tries the connection's direct path first and prepares a statement
    /// when the driver declines with [`Error::Skip`].
    pub fn query(&mut self, sql: &str, args: &[&dyn ToSql]) -> Result<Box<dyn Rows>> {
        let values = bind(args)?;
        match self.conn.query_context(&self.ctx, sql, &values) {
            Err(Error::Skip) => {}
            other => return other,
        }
        let mut stmt = self.conn.prepare_context(&self.ctx, sql)?;
        let rows = stmt.query_context(&self.ctx, &values);
        stmt.close()?;
        rows
    }

    /// Run a write.
    ///
    /// Tries the connection's direct path first and prepares a statement
    /// when the driver declines with [`Error::Skip`].
    pub fn execute(&mut self, sql: &str, args: &[&dyn ToSql]) -> Result<Box<dyn ExecResult>> {
        let values = bind(args)?;
        match self.conn.exec_context(&self.ctx, sql, &values) {
            Err(Error::Skip) => {}
            other => return other,
        }
        let mut stmt = self.conn.prepare_context(&self.ctx, sql)?;
        let result = stmt.exec_context(&self.ctx, &values);
        stmt.close()?;
        result
    }

    /// Prepare a statement for repeated execution.
    pub fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>> {
        self.conn.prepare_context(&self.ctx, sql)
    }

    /// Start a transaction.
    pub fn begin(&mut self) -> Result<Box<dyn Transaction>> {
        self.conn.begin()
    }

    /// The underlying connection.
    pub fn connection(&mut self) -> &mut dyn Connection {
        self.conn.as_mut()
    }

    /// Close the connection.
    pub fn close(mut self) -> Result<()> {
        self.conn.close()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("capabilities", &self.conn.capabilities())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catcher::MockCatcher;

    #[test]
    fn test_unknown_driver() {
        let err = open("sql-tests-missing", "dsn").err().unwrap();
        assert!(matches!(err, Error::UnknownDriver(name) if name == "sql-tests-missing"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let driver = Arc::new(MockCatcher::new().driver());
        register("sql-tests-dup", driver.clone()).unwrap();
        assert!(matches!(
            register("sql-tests-dup", driver),
            Err(Error::Registration(_))
        ));
        assert!(drivers().contains(&"sql-tests-dup".to_string()));
    }

    #[test]
    fn test_drivers_sorted() {
        register_if_absent("sql-tests-b", Arc::new(MockCatcher::new().driver()));
        register_if_absent("sql-tests-a", Arc::new(MockCatcher::new().driver()));
        let names = drivers();
        let a = names.iter().position(|n| n == "sql-tests-a").unwrap();
        let b = names.iter().position(|n| n == "sql-tests-b").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_bind_converts_arguments() {
        let values = bind(&[&27i32, &"x", &None::<i64>]).unwrap();
        assert_eq!(values, vec![SqlValue::Int(27), SqlValue::from("x"), SqlValue::Null]);
        assert!(bind(&[&u64::MAX]).is_err());
    }
}
