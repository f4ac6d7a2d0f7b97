//! Connection opening and per-connection configuration.

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

/// Builds the manager every request context opens its connection through.
///
/// The file does not have to exist yet; it is created on first open. Each
/// opened connection has foreign keys enabled and the configured busy
/// timeout applied. Use `:memory:` for a private in-memory database.
///
/// Rows are addressable by column name through `rusqlite::Row::get("name")`,
/// and declared `TIMESTAMP` columns decode into `chrono` date-times.
pub fn connection_manager(
    db_path: impl AsRef<Path>,
    settings: DbRuntimeSettings,
) -> SqliteConnectionManager {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    SqliteConnectionManager::file(db_path.as_ref())
        .with_flags(flags)
        .with_init(move |conn| {
            conn.execute_batch(&format!(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {};",
                settings.busy_timeout_ms
            ))
        })
}
