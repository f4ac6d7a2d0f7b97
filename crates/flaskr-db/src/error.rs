use thiserror::Error;

/// Errors surfaced by the database layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// The driver refused to open the database file.
    #[error("failed to open database connection: {0}")]
    Open(#[source] rusqlite::Error),

    /// A statement failed.
    #[error("database error: {0}")]
    Query(#[from] rusqlite::Error),

    /// The schema script failed to execute.
    #[error("failed to apply schema: {0}")]
    Schema(#[source] rusqlite::Error),

    /// The request context was already torn down.
    #[error("request database context is closed")]
    ContextClosed,

    /// The blocking task running a query panicked or was cancelled.
    #[error("database task failed: {0}")]
    Task(String),

    /// A thread panicked while holding the connection slot.
    #[error("database context lock poisoned")]
    Poisoned,
}
