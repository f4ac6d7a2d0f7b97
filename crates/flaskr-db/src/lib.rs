//! Database layer for flaskr.
//!
//! Owns everything between the HTTP layer and the SQLite file: how a
//! connection is opened and configured, how it is scoped to a single request,
//! and how the bundled schema is applied.
//!
//! # Design decisions
//!
//! - **One connection per request**: a [`DbContext`] is created for every
//!   request and opens its connection lazily on first use. Nothing is pooled
//!   across requests; concurrent access to the file is serialized by SQLite.
//! - **`r2d2_sqlite` as the opener**: [`connection_manager`] returns an
//!   [`r2d2_sqlite::SqliteConnectionManager`], and contexts open through the
//!   [`r2d2::ManageConnection`] trait. Tests substitute their own manager.
//! - **Embedded schema**: `schema.sql` is compiled into the binary via
//!   `include_str!` so the initializer cannot drift from the code.

mod connection;
mod context;
mod error;
mod schema;

pub use connection::{connection_manager, DbRuntimeSettings};
pub use context::DbContext;
pub use error::DbError;
pub use schema::{apply_schema, init_db, SCHEMA};
