//! Database mapping layer: field definitions, table schemas, SQL
//! compilation and the session unit of work.
//!
//! Backend implementations of [`DbExecutor`] live in the companion
//! backends crate; everything here is driver-agnostic.

#![allow(clippy::result_large_err)]

pub mod executor;
pub mod fields;
pub mod query;
pub mod schema;
pub mod session;
pub mod sql;
pub mod value;

pub use executor::DbExecutor;
pub use fields::{FieldDef, FieldKind};
pub use query::Query;
pub use schema::{Record, Registry, TableSchema};
pub use session::{OpKind, PendingOp, Session};
pub use sql::{Dialect, FromValue, Row, SqlCompiler};
pub use value::Value;
