//! # minorm-core
//!
//! Shared infrastructure for the minorm workspace: the [`OrmError`] error
//! type, logging setup, and database settings loading.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{OrmError, OrmResult, ValidationError};
pub use settings::DatabaseSettings;
