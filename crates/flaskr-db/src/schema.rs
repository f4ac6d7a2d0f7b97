//! The bundled schema and the administrative initializer.

use crate::{DbContext, DbError};
use r2d2::ManageConnection;
use rusqlite::Connection;

/// Table definitions for the application. Drops any existing tables first.
pub const SCHEMA: &str = include_str!("schema.sql");

/// Executes [`SCHEMA`] on an already-open connection.
///
/// # Errors
///
/// Returns `DbError::Schema` if any statement in the script fails.
pub fn apply_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(SCHEMA).map_err(DbError::Schema)
}

/// Clears existing data and creates fresh tables using the context's
/// connection.
///
/// This is destructive: every row in `user` and `post` is lost.
///
/// # Errors
///
/// Returns `DbError::Open` if the connection cannot be opened and
/// `DbError::Schema` if the script fails.
pub fn init_db<M>(ctx: &DbContext<M>) -> Result<(), DbError>
where
    M: ManageConnection<Connection = Connection, Error = rusqlite::Error>,
{
    ctx.with_conn(apply_schema)?;
    tracing::info!("database schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connection_manager, DbRuntimeSettings};
    use std::sync::Arc;

    #[test]
    fn schema_reapplies_and_clears_rows() {
        let ctx = DbContext::new(Arc::new(connection_manager(
            ":memory:",
            DbRuntimeSettings::default(),
        )));
        init_db(&ctx).expect("first init should succeed");

        ctx.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO user (username, password) VALUES ('test', 'x');
                 INSERT INTO post (author_id, title, body) VALUES (1, 'title', 'body');",
            )
            .map_err(DbError::from)
        })
        .expect("seed rows");

        init_db(&ctx).expect("re-running the schema should succeed");

        let (users, posts): (i64, i64) = ctx
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM user), (SELECT COUNT(*) FROM post)",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(DbError::from)
            })
            .expect("count rows");
        assert_eq!((users, posts), (0, 0), "init-db should wipe existing rows");
    }

    #[test]
    fn post_author_must_exist() {
        let ctx = DbContext::new(Arc::new(connection_manager(
            ":memory:",
            DbRuntimeSettings::default(),
        )));
        init_db(&ctx).unwrap();

        let result = ctx.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post (author_id, title, body) VALUES (42, 't', 'b')",
                [],
            )
            .map_err(DbError::from)
        });
        assert!(result.is_err(), "foreign keys should be enforced");
    }
}
