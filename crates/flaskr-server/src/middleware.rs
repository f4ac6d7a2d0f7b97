use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use flaskr_blog::{find_user_by_username, verify_password, User};
use flaskr_db::DbContext;
use std::sync::Arc;

use crate::api::ApiError;
use crate::AppState;

/// The user whose credentials accompanied the request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub User);

/// Gives every request its own [`DbContext`] and tears it down afterwards.
///
/// Handlers reach the context through `Extension<DbContext>`. Whatever the
/// handler returns, the connection (if one was opened) is closed before the
/// response leaves this middleware. If the request future is dropped instead,
/// the context closes the connection when its last clone goes away.
pub async fn db_lifecycle_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let ctx = state.db_context();
    req.extensions_mut().insert(ctx.clone());

    let response = next.run(req).await;

    ctx.teardown();
    Ok(response)
}

/// Middleware requiring HTTP Basic credentials of a registered user.
///
/// On success the user is stored in the request extensions as
/// [`AuthenticatedUser`]. Must run inside [`db_lifecycle_middleware`].
/// A 401 carries a `WWW-Authenticate: Basic` challenge.
pub async fn require_user(req: Request<Body>, next: Next) -> Response {
    match authenticate(req).await {
        Ok(req) => next.run(req).await,
        Err(err) => {
            let challenge = matches!(err, ApiError::Unauthorized(_));
            let mut response = err.into_response();
            if challenge {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_CHALLENGE),
                );
            }
            response
        }
    }
}

/// Challenge sent with every 401 from [`require_user`].
pub const BASIC_CHALLENGE: &str = "Basic realm=\"flaskr\"";

async fn authenticate(mut req: Request<Body>) -> Result<Request<Body>, ApiError> {
    let (username, password) = basic_credentials(&req)
        .ok_or_else(|| ApiError::Unauthorized("Login required.".to_string()))?;

    let db = req
        .extensions()
        .get::<DbContext>()
        .ok_or_else(|| ApiError::InternalServerError("missing database context".to_string()))?
        .clone();

    let user = db
        .call(move |conn| -> Result<User, ApiError> {
            // Unknown user and wrong password look the same from outside.
            let Some(user) = find_user_by_username(conn, &username)? else {
                return Err(ApiError::Unauthorized("Login required.".to_string()));
            };
            if !verify_password(&user.password_hash, &password)? {
                return Err(ApiError::Unauthorized("Login required.".to_string()));
            }
            Ok(user)
        })
        .await?;

    req.extensions_mut().insert(AuthenticatedUser(user));
    Ok(req)
}

/// Extracts `(username, password)` from an `Authorization: Basic` header.
fn basic_credentials(req: &Request<Body>) -> Option<(String, String)> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
