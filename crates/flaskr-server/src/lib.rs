//! flaskr server library logic: application assembly and HTTP wiring.

pub mod api;
pub mod api_auth;
pub mod api_blog;
pub mod config;
pub mod middleware;

use axum::{routing::get, Extension, Router};
use config::{Config, ConfigError, ConfigOverrides, ConfigSource};
use flaskr_db::{connection_manager, DbContext, DbError, DbRuntimeSettings};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration for this instance.
    pub config: Arc<Config>,
    /// Opens connections to this instance's database file.
    pub db: Arc<SqliteConnectionManager>,
}

impl AppState {
    /// Starts a new, empty request context. Nothing is opened yet.
    pub fn db_context(&self) -> DbContext {
        DbContext::new(Arc::clone(&self.db))
    }
}

/// Errors that abort application assembly.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create instance directory {path}: {source}")]
    InstanceDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A fully assembled application instance.
pub struct App {
    state: AppState,
    config_source: ConfigSource,
    router: Router,
}

impl App {
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn config_source(&self) -> &ConfigSource {
        &self.config_source
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The wired router, ready to serve.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Clears the existing data and creates new tables.
    ///
    /// Runs in its own request context, outside of HTTP handling.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database cannot be opened or the schema
    /// script fails.
    pub fn init_db(&self) -> Result<(), DbError> {
        let ctx = self.state.db_context();
        let result = flaskr_db::init_db(&ctx);
        ctx.teardown();
        result
    }
}

/// Builds an application rooted at `instance_path`.
///
/// Configuration is the built-in defaults, overlaid with `overrides` when
/// given, or with `<instance>/config.toml` (if present) otherwise. The
/// instance directory is created if it does not exist yet.
///
/// Each call produces an independent instance; nothing is shared between
/// two applications built in the same process.
///
/// # Errors
///
/// Returns `StartupError` if the configuration cannot be loaded or the
/// instance directory cannot be created.
pub fn create_app(
    instance_path: impl Into<PathBuf>,
    overrides: Option<ConfigOverrides>,
) -> Result<App, StartupError> {
    let instance_path = instance_path.into();
    let (config, config_source) = config::load_config(&instance_path, overrides)?;

    ensure_instance_dir(&config.instance_path)?;

    let db = connection_manager(
        &config.database,
        DbRuntimeSettings {
            busy_timeout_ms: config.busy_timeout_ms,
        },
    );

    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(db),
    };
    let router = app(state.clone());

    Ok(App {
        state,
        config_source,
        router,
    })
}

fn ensure_instance_dir(path: &Path) -> Result<(), StartupError> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(StartupError::InstanceDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// A simple page that says hello.
async fn hello() -> &'static str {
    "Hello, World!"
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .nest("/auth", api_auth::routes())
        .merge(api_blog::routes())
        .layer(axum::middleware::from_fn(
            middleware::db_lifecycle_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
