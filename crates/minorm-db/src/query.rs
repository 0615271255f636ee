//! Read-side entry point: equality-filtered SELECTs over one table.

use std::sync::Arc;

use minorm_core::{OrmError, OrmResult};

use crate::executor::DbExecutor;
use crate::schema::{Record, TableSchema};
use crate::value::Value;

/// A query bound to one table schema and one executor.
///
/// Filters are conjunctions of field equality tests; every condition is
/// checked against the schema before any SQL is issued.
pub struct Query<'a> {
    schema: Arc<TableSchema>,
    db: &'a dyn DbExecutor,
}

impl<'a> Query<'a> {
    pub fn new(schema: Arc<TableSchema>, db: &'a dyn DbExecutor) -> Self {
        Self { schema, db }
    }

    /// Fetches every row of the table.
    pub async fn all(&self) -> OrmResult<Vec<Record>> {
        let sql = self.db.compiler().select_all(self.schema.table());
        tracing::debug!(sql = %sql, "executing select");
        let rows = self.db.query(&sql, &[]).await?;
        Ok(rows
            .iter()
            .map(|row| Record::from_row(Arc::clone(&self.schema), row))
            .collect())
    }

    /// Fetches the rows matching every given field equality condition.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition list is empty or names a field the
    /// schema does not declare.
    pub async fn filter_by(&self, conditions: &[(&str, Value)]) -> OrmResult<Vec<Record>> {
        let conditions = self.checked(conditions)?;
        let (sql, params) = self
            .db
            .compiler()
            .select_where(self.schema.table(), &conditions);
        tracing::debug!(sql = %sql, "executing select");
        let rows = self.db.query(&sql, &params).await?;
        Ok(rows
            .iter()
            .map(|row| Record::from_row(Arc::clone(&self.schema), row))
            .collect())
    }

    /// Fetches exactly one row matching the conditions.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::DoesNotExist`] when no row matches and
    /// [`OrmError::MultipleObjectsReturned`] when more than one does, on
    /// top of the [`Query::filter_by`] condition checks.
    pub async fn get_by(&self, conditions: &[(&str, Value)]) -> OrmResult<Record> {
        let conditions = self.checked(conditions)?;
        let (sql, params) = self
            .db
            .compiler()
            .select_where(self.schema.table(), &conditions);
        tracing::debug!(sql = %sql, "executing select");
        let row = self.db.query_one(&sql, &params).await?;
        Ok(Record::from_row(Arc::clone(&self.schema), &row))
    }

    /// Counts the rows of the table.
    pub async fn count(&self) -> OrmResult<u64> {
        let sql = self.db.compiler().count(self.schema.table());
        tracing::debug!(sql = %sql, "executing count");
        let row = self.db.query_one(&sql, &[]).await?;
        let n: i64 = row.get("count")?;
        u64::try_from(n)
            .map_err(|_| OrmError::Database(format!("negative row count {n}")))
    }

    fn checked<'c>(
        &self,
        conditions: &[(&'c str, Value)],
    ) -> OrmResult<Vec<(&'c str, Value)>> {
        if conditions.is_empty() {
            return Err(OrmError::ImproperlyConfigured(
                "filter requires at least one condition".to_string(),
            ));
        }
        for (name, _) in conditions {
            if self.schema.field(name).is_none() {
                return Err(OrmError::ImproperlyConfigured(format!(
                    "table '{}' has no field '{name}'",
                    self.schema.table()
                )));
            }
        }
        Ok(conditions.to_vec())
    }
}
