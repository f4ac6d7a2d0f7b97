//! Users and posts for the flaskr blog.
//!
//! Every function takes a borrowed `rusqlite::Connection`; callers decide
//! where the connection comes from (normally the request's `DbContext`).

mod password;
mod posts;
mod users;

use thiserror::Error;

pub use password::{hash_password, verify_password};
pub use posts::{create_post, delete_post, get_post, list_posts, update_post, Post};
pub use users::{find_user_by_username, register_user, User};

/// Errors that can occur during blog operations.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("user {0} is already registered")]
    Duplicate(String),
    #[error("malformed password hash")]
    InvalidHash,
}
