//! Blog posts.

use crate::BlogError;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

/// A post joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    /// Creation time (UTC), decoded from the `TIMESTAMP` column.
    pub created: NaiveDateTime,
    pub author_id: i64,
    pub username: String,
}

const SELECT_POSTS: &str = "SELECT p.id AS id, p.title AS title, p.body AS body,
            p.created AS created, p.author_id AS author_id, u.username AS username
     FROM post p JOIN user u ON p.author_id = u.id";

/// Lists every post, newest first.
pub fn list_posts(conn: &Connection) -> Result<Vec<Post>, BlogError> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY p.created DESC, p.id DESC",
        SELECT_POSTS
    ))?;
    let posts = stmt
        .query_map([], map_row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Fetches a single post.
///
/// # Errors
///
/// Returns `BlogError::NotFound` if no post has this id.
pub fn get_post(conn: &Connection, id: i64) -> Result<Post, BlogError> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", SELECT_POSTS),
        [id],
        map_row_to_post,
    )
    .optional()?
    .ok_or_else(|| BlogError::NotFound(format!("post {}", id)))
}

pub fn create_post(
    conn: &Connection,
    author_id: i64,
    title: &str,
    body: &str,
) -> Result<Post, BlogError> {
    conn.execute(
        "INSERT INTO post (title, body, author_id) VALUES (?1, ?2, ?3)",
        params![title, body, author_id],
    )?;
    get_post(conn, conn.last_insert_rowid())
}

/// Replaces a post's title and body.
///
/// # Errors
///
/// Returns `BlogError::NotFound` if no post has this id.
pub fn update_post(conn: &Connection, id: i64, title: &str, body: &str) -> Result<Post, BlogError> {
    let updated = conn.execute(
        "UPDATE post SET title = ?1, body = ?2 WHERE id = ?3",
        params![title, body, id],
    )?;
    if updated == 0 {
        return Err(BlogError::NotFound(format!("post {}", id)));
    }
    get_post(conn, id)
}

/// Deletes a post.
///
/// # Errors
///
/// Returns `BlogError::NotFound` if no post has this id.
pub fn delete_post(conn: &Connection, id: i64) -> Result<(), BlogError> {
    let deleted = conn.execute("DELETE FROM post WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(BlogError::NotFound(format!("post {}", id)));
    }
    Ok(())
}

fn map_row_to_post(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        created: row.get("created")?,
        author_id: row.get("author_id")?,
        username: row.get("username")?,
    })
}
