//! Shared connection handling for the `SQLite` backend.
//!
//! Mutex acquisition with poison recovery and pragma configuration.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How long `SQLite` waits on a locked database before reporting `SQLITE_BUSY`.
#[cfg(not(test))]
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Short enough that contention tests fail fast.
#[cfg(test)]
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(100);

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning. An open transaction is
/// rolled back when its guard unwinds, so the connection is still usable.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection for the adapter.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers alongside the single writer
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: lock contention waits up to [`BUSY_TIMEOUT`], then
///   surfaces as an error instead of hanging
/// - **`foreign_keys`**: enforced, as the strict backend would
///
/// # Errors
///
/// Returns [`Error::Connection`] if foreign key enforcement cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal" or "memory"), so the result is ignored
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    conn.busy_timeout(BUSY_TIMEOUT).map_err(|e| Error::Connection {
        cause: format!("busy_timeout: {e}"),
    })?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| Error::Connection {
            cause: format!("foreign_keys: {e}"),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_lock_concurrent() {
        let mutex = Arc::new(Mutex::new(0));
        let mut handles = vec![];

        for _ in 0..10 {
            let mutex_clone = Arc::clone(&mutex);
            let handle = thread::spawn(move || {
                let mut guard = acquire_lock(&mutex_clone);
                *guard += 1;
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let guard = acquire_lock(&mutex);
        assert_eq!(*guard, 10);
    }

    #[test]
    fn test_acquire_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the mutex");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*acquire_lock(&mutex), 1);
    }

    #[test]
    fn test_configure_connection() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        let busy_timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(busy_timeout, i64::try_from(BUSY_TIMEOUT.as_millis()).unwrap());

        let foreign_keys: i32 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
