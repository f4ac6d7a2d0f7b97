//! Blog route group: the public index and post pages, plus authoring
//! routes guarded by [`require_user`](crate::middleware::require_user).

use crate::api::ApiError;
use crate::middleware::{require_user, AuthenticatedUser};
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use flaskr_blog::{create_post, delete_post, get_post, list_posts, update_post, BlogError, Post};
use flaskr_db::DbContext;
use rusqlite::Connection;
use serde::Deserialize;

/// Request body for creating or editing a post.
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl PostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.is_empty() {
            return Err(ApiError::BadRequest("Title is required.".to_string()));
        }
        Ok(())
    }
}

pub fn routes() -> Router {
    let authoring = Router::new()
        .route("/create", post(create_handler))
        .route("/{id}/update", post(update_handler))
        .route("/{id}/delete", post(delete_handler))
        .layer(axum::middleware::from_fn(require_user));

    Router::new()
        .route("/", get(index_handler))
        .route("/{id}", get(get_post_handler))
        .merge(authoring)
}

/// Loads a post, optionally requiring that `author_id` wrote it.
fn load_post(conn: &Connection, id: i64, author_id: Option<i64>) -> Result<Post, ApiError> {
    let post = match get_post(conn, id) {
        Ok(post) => post,
        Err(BlogError::NotFound(_)) => {
            return Err(ApiError::NotFound(format!("Post id {} doesn't exist.", id)));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(author_id) = author_id {
        if post.author_id != author_id {
            return Err(ApiError::Forbidden(format!(
                "Post id {} belongs to another user.",
                id
            )));
        }
    }
    Ok(post)
}

/// Handler for `GET /`.
pub async fn index_handler(
    Extension(db): Extension<DbContext>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = db
        .call(|conn| -> Result<Vec<Post>, ApiError> { Ok(list_posts(conn)?) })
        .await?;
    Ok(Json(posts))
}

/// Handler for `GET /{id}`.
pub async fn get_post_handler(
    Extension(db): Extension<DbContext>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = db.call(move |conn| load_post(conn, id, None)).await?;
    Ok(Json(post))
}

/// Handler for `POST /create`.
pub async fn create_handler(
    Extension(db): Extension<DbContext>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    payload.validate()?;

    let post = db
        .call(move |conn| -> Result<Post, ApiError> {
            Ok(create_post(conn, user.id, &payload.title, &payload.body)?)
        })
        .await?;

    tracing::info!(post_id = post.id, author_id = post.author_id, "created post");
    Ok((StatusCode::CREATED, Json(post)))
}

/// Handler for `POST /{id}/update`.
pub async fn update_handler(
    Extension(db): Extension<DbContext>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<Post>, ApiError> {
    payload.validate()?;

    let post = db
        .call(move |conn| -> Result<Post, ApiError> {
            load_post(conn, id, Some(user.id))?;
            Ok(update_post(conn, id, &payload.title, &payload.body)?)
        })
        .await?;

    Ok(Json(post))
}

/// Handler for `POST /{id}/delete`.
pub async fn delete_handler(
    Extension(db): Extension<DbContext>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    db.call(move |conn| -> Result<(), ApiError> {
        load_post(conn, id, Some(user.id))?;
        Ok(delete_post(conn, id)?)
    })
    .await?;

    tracing::info!(post_id = id, "deleted post");
    Ok(StatusCode::NO_CONTENT)
}
