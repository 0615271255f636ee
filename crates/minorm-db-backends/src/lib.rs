//! Backend implementations of [`minorm_db::DbExecutor`].
//!
//! SQLite ships by default; MySQL sits behind the `mysql` feature.

#![allow(clippy::result_large_err)]

pub mod base;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use base::{connect, DatabaseConfig};
#[cfg(feature = "mysql")]
pub use mysql::MySqlBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
