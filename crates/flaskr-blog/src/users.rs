//! Registered users.

use crate::{hash_password, BlogError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Salted hash, see [`crate::hash_password`].
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Registers a new user, storing only a salted hash of the password.
///
/// # Errors
///
/// Returns `BlogError::Duplicate` if the username is taken.
pub fn register_user(conn: &Connection, username: &str, password: &str) -> Result<User, BlogError> {
    let password_hash = hash_password(password);
    match conn.execute(
        "INSERT INTO user (username, password) VALUES (?1, ?2)",
        params![username, password_hash],
    ) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            return Err(BlogError::Duplicate(username.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, username, "registered user");
    Ok(User {
        id,
        username: username.to_string(),
        password_hash,
    })
}

/// Looks up a user by name. Returns `None` if no such user exists.
pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, BlogError> {
    let user = conn
        .query_row(
            "SELECT id, username, password FROM user WHERE username = ?1",
            [username],
            map_row_to_user,
        )
        .optional()?;
    Ok(user)
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password")?,
    })
}
