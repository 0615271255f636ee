//! The database executor trait.
//!
//! [`DbExecutor`] is the bridge between the ORM layer and the concrete
//! backends in `minorm-db-backends`. The [`Query`](crate::query::Query)
//! object and the [`Session`](crate::session::Session) accept
//! `&dyn DbExecutor`, so the ORM crate never depends on a driver.

use minorm_core::{OrmError, OrmResult};

use crate::sql::{Dialect, Row, SqlCompiler};
use crate::value::Value;

/// Minimal async database executor.
///
/// One implementation per backend. All methods are async because database
/// operations are I/O-bound; backends over synchronous drivers wrap calls
/// in `spawn_blocking`.
#[async_trait::async_trait]
pub trait DbExecutor: Send + Sync {
    /// Returns the vendor name (e.g. "sqlite", "mysql").
    fn vendor(&self) -> &str;

    /// Returns the SQL dialect this executor speaks.
    fn dialect(&self) -> Dialect;

    /// Returns a SQL compiler configured for this executor's dialect.
    fn compiler(&self) -> SqlCompiler {
        SqlCompiler::new(self.dialect())
    }

    /// Runs a SQL statement that does not return rows.
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64>;

    /// Runs a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Runs a SQL query and returns exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::DoesNotExist`] on zero rows and
    /// [`OrmError::MultipleObjectsReturned`] on more than one.
    async fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row> {
        let rows = self.query(sql, params).await?;
        let count = rows.len();
        let mut iter = rows.into_iter();
        match (iter.next(), count) {
            (Some(row), 1) => Ok(row),
            (None, _) => Err(OrmError::DoesNotExist("No rows returned".to_string())),
            (Some(_), n) => Err(OrmError::MultipleObjectsReturned(format!(
                "Expected 1 row, got {n}"
            ))),
        }
    }

    /// Executes an INSERT and returns the database-assigned row id.
    ///
    /// Backends implement this with their driver's native last-insert-id
    /// mechanism.
    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Value>;

    /// Begins a transaction.
    async fn begin(&self) -> OrmResult<()> {
        self.execute("BEGIN", &[]).await?;
        Ok(())
    }

    /// Commits the current transaction.
    async fn commit(&self) -> OrmResult<()> {
        self.execute("COMMIT", &[]).await?;
        Ok(())
    }

    /// Rolls back the current transaction.
    async fn rollback(&self) -> OrmResult<()> {
        self.execute("ROLLBACK", &[]).await?;
        Ok(())
    }
}
