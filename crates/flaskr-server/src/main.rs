//! flaskr server binary.
//!
//! `serve` (the default) starts the axum HTTP server with structured logging
//! and graceful shutdown on SIGTERM/SIGINT. `init-db` wipes and recreates the
//! database schema, then exits.

use clap::{Parser, Subcommand};
use flaskr_server::config::LoggingConfig;
use flaskr_server::App;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// A small blog with user accounts, backed by a single SQLite file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Instance directory holding the database and an optional config.toml.
    #[arg(long, env = "FLASKR_INSTANCE_PATH", default_value = "instance")]
    instance_path: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Clear the existing data and create new tables.
    InitDb,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app = flaskr_server::create_app(cli.instance_path.clone(), None)
        .expect("failed to assemble application; check the instance directory and its config.toml");

    init_tracing(&app.config().logging);

    tracing::info!(
        instance = %app.config().instance_path.display(),
        database = %app.config().database.display(),
        source = app.config_source().as_str(),
        "resolved startup configuration"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::InitDb => {
            app.init_db().expect("failed to initialize the database");
            println!("Initialized the database.");
        }
        Command::Serve => serve(app).await,
    }
}

async fn serve(app: App) {
    if app.config().uses_default_secret() {
        tracing::warn!("secret_key is the development default; set it in config.toml before deploying");
    }

    let addr = SocketAddr::new(app.config().server.host, app.config().server.port);
    tracing::info!(%addr, "starting flaskr server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(listener, app.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("flaskr server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
        () = terminate => { tracing::info!("received SIGTERM, shutting down"); }
    }
}
