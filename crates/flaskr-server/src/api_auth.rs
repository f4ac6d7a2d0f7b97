//! `/auth` route group: account registration and credential checks.

use crate::api::ApiError;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    routing::post,
    Router,
};
use flaskr_blog::{find_user_by_username, register_user, verify_password, User};
use flaskr_db::DbContext;
use serde::{Deserialize, Serialize};

/// Request body for registration and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

pub fn routes() -> Router {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
}

fn validate(payload: &CredentialsRequest) -> Result<(), ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::BadRequest("Username is required.".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required.".to_string()));
    }
    Ok(())
}

/// Handler for `POST /auth/register`.
pub async fn register_handler(
    Extension(db): Extension<DbContext>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate(&payload)?;

    let user = db
        .call(move |conn| -> Result<User, ApiError> {
            Ok(register_user(conn, &payload.username, &payload.password)?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Handler for `POST /auth/login`.
///
/// Checks the credentials and returns the user. No session is created;
/// protected routes take the same credentials via HTTP Basic. Empty fields
/// fail the same way as wrong ones.
pub async fn login_handler(
    Extension(db): Extension<DbContext>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = db
        .call(move |conn| -> Result<User, ApiError> {
            let Some(user) = find_user_by_username(conn, &payload.username)? else {
                return Err(ApiError::Unauthorized("Incorrect username.".to_string()));
            };
            if !verify_password(&user.password_hash, &payload.password)? {
                return Err(ApiError::Unauthorized("Incorrect password.".to_string()));
            }
            Ok(user)
        })
        .await?;

    tracing::debug!(user_id = user.id, "login succeeded");
    Ok(Json(user.into()))
}
