//! Request-scoped connection handling.
//!
//! A [`DbContext`] belongs to exactly one request. It opens at most one
//! connection, on first use, and closes it when the request is torn down.
//! Clones share the same slot so the context can travel through request
//! extensions and into blocking tasks.

use crate::DbError;
use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

/// The connection slot for one request context.
#[derive(Default)]
struct Slot {
    conn: Option<Connection>,
    closed: bool,
}

struct Inner<M> {
    manager: Arc<M>,
    slot: Mutex<Slot>,
}

/// Lazily opened, memoized database connection for a single request.
pub struct DbContext<M = SqliteConnectionManager> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for DbContext<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> DbContext<M>
where
    M: ManageConnection<Connection = Connection, Error = rusqlite::Error>,
{
    /// Creates an empty context. No connection is opened until
    /// [`with_conn`](Self::with_conn) is first called.
    pub fn new(manager: Arc<M>) -> Self {
        Self {
            inner: Arc::new(Inner {
                manager,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    /// Runs `f` against this context's connection, opening it on first use.
    ///
    /// Every call on the same context sees the same connection.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Open` with the driver's error if the connection
    /// cannot be opened, and `DbError::ContextClosed` after
    /// [`teardown`](Self::teardown). Errors from `f` pass through.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut slot = self.inner.slot.lock().map_err(|_| DbError::Poisoned)?;
        if slot.closed {
            return Err(DbError::ContextClosed.into());
        }

        if slot.conn.is_none() {
            let conn = self.inner.manager.connect().map_err(DbError::Open)?;
            tracing::debug!("opened request database connection");
            slot.conn = Some(conn);
        }

        match slot.conn.as_ref() {
            Some(conn) => f(conn),
            None => Err(DbError::ContextClosed.into()),
        }
    }

    /// Async form of [`with_conn`](Self::with_conn) that runs `f` on the
    /// blocking thread pool.
    ///
    /// # Errors
    ///
    /// As `with_conn`, plus `DbError::Task` if the blocking task fails.
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        let ctx = self.clone();
        tokio::task::spawn_blocking(move || ctx.with_conn(f))
            .await
            .map_err(|e| E::from(DbError::Task(e.to_string())))?
    }
}

impl<M> DbContext<M> {
    /// Closes the connection if one was opened and marks the context closed.
    ///
    /// Safe to call any number of times. Returns `true` only when this call
    /// closed a connection.
    pub fn teardown(&self) -> bool {
        let conn = {
            let mut slot = self
                .inner
                .slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            slot.closed = true;
            slot.conn.take()
        };

        match conn {
            Some(conn) => {
                close_connection(conn);
                true
            }
            None => false,
        }
    }

    /// Whether a connection is currently open in this context.
    pub fn is_open(&self) -> bool {
        self.inner
            .slot
            .lock()
            .map(|slot| slot.conn.is_some())
            .unwrap_or(false)
    }
}

impl<M> Drop for Inner<M> {
    fn drop(&mut self) {
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(conn) = slot.conn.take() {
            tracing::debug!("request context dropped before teardown");
            close_connection(conn);
        }
    }
}

fn close_connection(conn: Connection) {
    match conn.close() {
        Ok(()) => tracing::debug!("closed request database connection"),
        Err((_conn, e)) => {
            tracing::warn!(error = %e, "failed to close request database connection");
        }
    }
}
