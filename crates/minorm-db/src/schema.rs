//! Table schemas and records.
//!
//! [`TableSchema`] aggregates a table's [`FieldDef`]s at construction time:
//! at most one primary key is allowed, unique fields are collected into a
//! unique-key list, and CREATE/DROP TABLE statements are generated from the
//! per-field DDL fragments.
//!
//! [`Record`] is one row of a table: a schema-ordered mapping from field
//! name to [`Value`] with a `read_from_db` flag and per-field dirty
//! tracking. Assignment validates through [`FieldDef::clean`] and leaves
//! the stored value untouched on failure.

use std::sync::Arc;

use minorm_core::{OrmError, OrmResult};

use crate::executor::DbExecutor;
use crate::fields::FieldDef;
use crate::sql::{Dialect, Row};
use crate::value::Value;

/// The aggregated definition of one table.
#[derive(Debug)]
pub struct TableSchema {
    table: String,
    fields: Vec<FieldDef>,
    primary_key: Option<usize>,
    unique_keys: Vec<usize>,
}

impl TableSchema {
    /// Aggregates field definitions into a schema.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ImproperlyConfigured`] on a duplicate primary-key
    /// declaration or a duplicate field name.
    pub fn new(table: impl Into<String>, fields: Vec<FieldDef>) -> OrmResult<Self> {
        let table = table.into();
        let mut primary_key = None;
        let mut unique_keys = Vec::new();

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(OrmError::ImproperlyConfigured(format!(
                    "table '{table}' declares field '{}' more than once",
                    field.name
                )));
            }
            if field.primary_key {
                if primary_key.is_some() {
                    return Err(OrmError::ImproperlyConfigured(format!(
                        "table '{table}' declares more than one primary key"
                    )));
                }
                primary_key = Some(i);
            }
            if field.unique {
                unique_keys.push(i);
            }
        }

        Ok(Self {
            table,
            fields,
            primary_key,
            unique_keys,
        })
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the ordered field definitions.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Returns the field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the index of the field with the given name.
    pub(crate) fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the primary-key field, if one is declared.
    pub fn primary_key(&self) -> Option<&FieldDef> {
        self.primary_key.map(|i| &self.fields[i])
    }

    /// Returns the names of the fields carrying a UNIQUE constraint.
    pub fn unique_keys(&self) -> Vec<&'static str> {
        self.unique_keys.iter().map(|&i| self.fields[i].name).collect()
    }

    /// Returns the ordered column names.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Generates the CREATE TABLE statement for this schema.
    ///
    /// # Errors
    ///
    /// Returns an error if any field's DDL fragment cannot be rendered.
    pub fn create_table_sql(&self, dialect: Dialect) -> OrmResult<String> {
        let fragments: Vec<String> = self
            .fields
            .iter()
            .map(|f| f.ddl(dialect))
            .collect::<OrmResult<_>>()?;
        let suffix = match dialect {
            Dialect::MySQL => " ENGINE=InnoDB DEFAULT CHARSET=utf8",
            Dialect::SQLite => "",
        };
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n){}",
            self.table,
            fragments.join(",\n    "),
            suffix
        ))
    }

    /// Generates the DROP TABLE statement for this schema.
    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table)
    }
}

/// One row of a table, held in schema field order.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<TableSchema>,
    values: Vec<Value>,
    dirty: Vec<bool>,
    read_from_db: bool,
}

impl Record {
    /// Creates an empty record; every field starts as `Null`.
    pub fn new(schema: Arc<TableSchema>) -> Self {
        let n = schema.fields().len();
        Self {
            schema,
            values: vec![Value::Null; n],
            dirty: vec![false; n],
            read_from_db: false,
        }
    }

    /// Builds a record from a database row. The record is flagged as
    /// database-sourced and starts with no dirty fields.
    pub fn from_row(schema: Arc<TableSchema>, row: &Row) -> Self {
        let values: Vec<Value> = schema
            .fields()
            .iter()
            .map(|f| row.get_value(f.name).cloned().unwrap_or(Value::Null))
            .collect();
        let n = values.len();
        Self {
            schema,
            values,
            dirty: vec![false; n],
            read_from_db: true,
        }
    }

    /// Returns the schema this record belongs to.
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Returns `true` if this record originated from a database read.
    pub const fn read_from_db(&self) -> bool {
        self.read_from_db
    }

    /// Assigns a field value, validating and normalizing it first.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name or a value rejected by
    /// the field's validation; the stored value is left untouched.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> OrmResult<()> {
        let idx = self.schema.field_index(field).ok_or_else(|| {
            OrmError::ImproperlyConfigured(format!(
                "table '{}' has no field '{field}'",
                self.schema.table()
            ))
        })?;
        let cleaned = self.schema.fields()[idx].clean(value.into())?;
        self.values[idx] = cleaned;
        self.dirty[idx] = true;
        Ok(())
    }

    /// Returns a field's stored value. Unassigned fields read as `Null`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown field name.
    pub fn get(&self, field: &str) -> OrmResult<&Value> {
        self.schema
            .field_index(field)
            .map(|i| &self.values[i])
            .ok_or_else(|| {
                OrmError::ImproperlyConfigured(format!(
                    "table '{}' has no field '{field}'",
                    self.schema.table()
                ))
            })
    }

    /// Returns all `(name, value)` pairs in schema order.
    pub fn field_values(&self) -> Vec<(&'static str, Value)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(f, v)| (f.name, v.clone()))
            .collect()
    }

    /// Returns the `(name, value)` pairs assigned since construction or the
    /// last database read.
    pub fn dirty_fields(&self) -> Vec<(&'static str, Value)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .zip(&self.dirty)
            .filter(|(_, &dirty)| dirty)
            .map(|((f, v), _)| (f.name, v.clone()))
            .collect()
    }

    /// Returns the `(name, value)` pairs NOT assigned since construction or
    /// the last database read.
    pub fn unchanged_fields(&self) -> Vec<(&'static str, Value)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .zip(&self.dirty)
            .filter(|(_, &dirty)| !dirty)
            .map(|((f, v), _)| (f.name, v.clone()))
            .collect()
    }

    /// Returns the primary-key field name and its current value, if the
    /// schema declares one.
    pub fn pk(&self) -> Option<(&'static str, &Value)> {
        self.schema
            .primary_key
            .map(|i| (self.schema.fields()[i].name, &self.values[i]))
    }

    /// Writes a database-assigned primary-key value back into the record
    /// without marking it dirty.
    pub(crate) fn write_back_pk(&mut self, value: Value) {
        if let Some(i) = self.schema.primary_key {
            self.values[i] = value;
        }
    }

    /// Resets dirty tracking, treating the current values as persisted.
    pub(crate) fn mark_persisted(&mut self) {
        self.dirty.iter_mut().for_each(|d| *d = false);
        self.read_from_db = true;
    }
}

/// An ordered collection of schemas with bulk DDL helpers.
///
/// Replaces iterating over every model type by hand when setting up or
/// tearing down a database.
#[derive(Debug, Default)]
pub struct Registry {
    schemas: Vec<Arc<TableSchema>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema to the registry.
    pub fn register(&mut self, schema: Arc<TableSchema>) {
        self.schemas.push(schema);
    }

    /// Returns the registered schemas in registration order.
    pub fn schemas(&self) -> &[Arc<TableSchema>] {
        &self.schemas
    }

    /// Creates every registered table.
    pub async fn create_all(&self, db: &dyn DbExecutor) -> OrmResult<()> {
        for schema in &self.schemas {
            let sql = schema.create_table_sql(db.dialect())?;
            tracing::debug!(table = schema.table(), "creating table");
            db.execute(&sql, &[]).await?;
        }
        Ok(())
    }

    /// Drops every registered table.
    pub async fn drop_all(&self, db: &dyn DbExecutor) -> OrmResult<()> {
        for schema in &self.schemas {
            tracing::debug!(table = schema.table(), "dropping table");
            db.execute(&schema.drop_table_sql(), &[]).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDef;

    fn user_schema() -> Arc<TableSchema> {
        Arc::new(
            TableSchema::new(
                "user",
                vec![
                    FieldDef::integer("id").primary_key().auto_increment(),
                    FieldDef::varchar("username", 32).unique(),
                    FieldDef::integer("age").range(0, 150),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_schema_aggregation() {
        let schema = user_schema();
        assert_eq!(schema.table(), "user");
        assert_eq!(schema.column_names(), vec!["id", "username", "age"]);
        assert_eq!(schema.primary_key().unwrap().name, "id");
        assert_eq!(schema.unique_keys(), vec!["username"]);
    }

    #[test]
    fn test_duplicate_primary_key_rejected() {
        let result = TableSchema::new(
            "bad",
            vec![
                FieldDef::integer("a").primary_key(),
                FieldDef::integer("b").primary_key(),
            ],
        );
        assert!(matches!(result, Err(OrmError::ImproperlyConfigured(_))));
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let result = TableSchema::new(
            "bad",
            vec![FieldDef::integer("a"), FieldDef::integer("a")],
        );
        assert!(matches!(result, Err(OrmError::ImproperlyConfigured(_))));
    }

    #[test]
    fn test_create_table_sql_sqlite() {
        let schema = user_schema();
        let sql = schema.create_table_sql(Dialect::SQLite).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS user (\n    \
             id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
             username VARCHAR(32) UNIQUE,\n    \
             age INTEGER\n)"
        );
    }

    #[test]
    fn test_create_table_sql_mysql_suffix() {
        let schema = user_schema();
        let sql = schema.create_table_sql(Dialect::MySQL).unwrap();
        assert!(sql.ends_with("ENGINE=InnoDB DEFAULT CHARSET=utf8"));
        assert!(sql.contains("AUTO_INCREMENT"));
    }

    #[test]
    fn test_drop_table_sql() {
        assert_eq!(user_schema().drop_table_sql(), "DROP TABLE IF EXISTS user");
    }

    #[test]
    fn test_record_set_and_get() {
        let mut record = Record::new(user_schema());
        record.set("username", "lrh").unwrap();
        record.set("age", 30).unwrap();
        assert_eq!(record.get("username").unwrap(), &Value::from("lrh"));
        assert_eq!(record.get("age").unwrap(), &Value::Int(30));
        assert_eq!(record.get("id").unwrap(), &Value::Null);
    }

    #[test]
    fn test_record_failed_set_does_not_mutate() {
        let mut record = Record::new(user_schema());
        record.set("age", 30).unwrap();
        assert!(record.set("age", 200).is_err());
        assert_eq!(record.get("age").unwrap(), &Value::Int(30));
    }

    #[test]
    fn test_record_unknown_field() {
        let mut record = Record::new(user_schema());
        assert!(record.set("email", "x@y.z").is_err());
        assert!(record.get("email").is_err());
    }

    #[test]
    fn test_record_dirty_tracking() {
        let mut record = Record::new(user_schema());
        record.set("username", "lrh").unwrap();
        let dirty = record.dirty_fields();
        assert_eq!(dirty, vec![("username", Value::from("lrh"))]);
        let unchanged = record.unchanged_fields();
        assert_eq!(unchanged.len(), 2);
        assert!(!record.read_from_db());
    }

    #[test]
    fn test_record_from_row() {
        let schema = user_schema();
        let row = Row::new(
            vec!["id".to_string(), "username".to_string(), "age".to_string()],
            vec![Value::Int(1), Value::from("lrh"), Value::Int(30)],
        );
        let record = Record::from_row(schema, &row);
        assert!(record.read_from_db());
        assert!(record.dirty_fields().is_empty());
        assert_eq!(record.get("id").unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_record_pk() {
        let mut record = Record::new(user_schema());
        assert_eq!(record.pk(), Some(("id", &Value::Null)));
        record.set("id", 7).unwrap();
        assert_eq!(record.pk(), Some(("id", &Value::Int(7))));
    }

    #[test]
    fn test_registry_ordering() {
        let mut registry = Registry::new();
        registry.register(user_schema());
        registry.register(Arc::new(
            TableSchema::new("post", vec![FieldDef::integer("id").primary_key()]).unwrap(),
        ));
        let names: Vec<&str> = registry.schemas().iter().map(|s| s.table()).collect();
        assert_eq!(names, vec!["user", "post"]);
    }
}
