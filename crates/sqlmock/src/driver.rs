//! The mock driver and its per-DSN databases.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::api::{Connection, Driver};
use crate::catcher::MockCatcher;
use crate::connection::MockConnection;
use crate::error::Result;

/// A logical database, created on first open of its DSN and shared by every
/// later connection to the same DSN.
#[derive(Debug, Clone)]
pub struct MockDatabase {
    inner: Arc<DatabaseInner>,
}

#[derive(Debug)]
struct DatabaseInner {
    name: String,
    bad_connection: AtomicBool,
}

impl MockDatabase {
    fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                name: name.to_owned(),
                bad_connection: AtomicBool::new(false),
            }),
        }
    }

    /// DSN this database was opened with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Make `begin` and `prepare` fail with
    /// [`Error::BadConnection`](crate::Error::BadConnection) on every
    /// connection to this database.
    pub fn set_bad_connection(&self, bad: bool) {
        self.inner.bad_connection.store(bad, Ordering::SeqCst);
    }

    /// Check if connections to this database are simulated as broken.
    #[must_use]
    pub fn is_bad_connection(&self) -> bool {
        self.inner.bad_connection.load(Ordering::SeqCst)
    }

    /// Check if two handles refer to the same database.
    #[must_use]
    pub fn ptr_eq(&self, other: &MockDatabase) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Counters and the database cache, shared by every driver handle of one
/// catcher.
#[derive(Debug, Default)]
pub(crate) struct DriverState {
    open_count: AtomicUsize,
    close_count: AtomicUsize,
    databases: Mutex<HashMap<String, MockDatabase>>,
}

impl DriverState {
    fn database(&self, name: &str) -> MockDatabase {
        let mut databases = self.databases.lock();
        if let Some(db) = databases.get(name) {
            return db.clone();
        }
        let db = MockDatabase::new(name);
        databases.insert(name.to_owned(), db.clone());
        tracing::debug!(database = name, "created database");
        db
    }

    pub(crate) fn record_close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Driver whose connections resolve every statement through a
/// [`MockCatcher`].
#[derive(Debug, Clone)]
pub struct MockDriver {
    catcher: MockCatcher,
    state: Arc<DriverState>,
}

impl MockDriver {
    pub(crate) fn new(catcher: MockCatcher, state: Arc<DriverState>) -> Self {
        Self { catcher, state }
    }

    /// The catcher statements are resolved against.
    #[must_use]
    pub fn catcher(&self) -> &MockCatcher {
        &self.catcher
    }

    /// Open a connection to `dsn`, creating its database on first use.
    pub fn connect(&self, dsn: &str) -> Result<MockConnection> {
        let db = self.state.database(dsn);
        let opened = self.state.open_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(database = dsn, opened, "connection opened");
        Ok(MockConnection::new(
            db,
            self.catcher.clone(),
            Arc::clone(&self.state),
        ))
    }

    /// The database cached for `dsn`, if it has been opened.
    #[must_use]
    pub fn database(&self, dsn: &str) -> Option<MockDatabase> {
        self.state.databases.lock().get(dsn).cloned()
    }

    /// Number of connections opened.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.state.open_count.load(Ordering::SeqCst)
    }

    /// Number of connections closed.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.state.close_count.load(Ordering::SeqCst)
    }
}

impl Driver for MockDriver {
    fn open(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(self.connect(dsn)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_database_cached_per_dsn() {
        let driver = MockCatcher::new().driver();
        let a = driver.connect("db").unwrap();
        let b = driver.connect("db").unwrap();
        let c = driver.connect("other").unwrap();

        assert!(a.database().unwrap().ptr_eq(&b.database().unwrap()));
        assert!(!a.database().unwrap().ptr_eq(&c.database().unwrap()));
        assert_eq!(driver.open_count(), 3);
    }

    #[test]
    fn test_close_count_includes_drop() {
        let driver = MockCatcher::new().driver();
        let mut conn = driver.open("db").unwrap();
        conn.close().unwrap();
        conn.close().unwrap();
        drop(driver.connect("db").unwrap());
        assert_eq!(driver.close_count(), 2);
    }

    #[test]
    fn test_handles_share_state() {
        let catcher = MockCatcher::new();
        let _conn = catcher.driver().connect("db").unwrap();
        assert_eq!(catcher.driver().open_count(), 1);
        assert!(catcher.driver().database("db").is_some());
    }
}
