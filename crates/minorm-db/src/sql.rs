//! SQL statement compilation.
//!
//! [`SqlCompiler`] turns schema-level operations into parameterized SQL
//! strings for a target [`Dialect`]. Every value travels through a driver
//! placeholder; nothing is interpolated into statement text. [`Row`] and
//! [`FromValue`] carry result rows back from the backends with typed access.

use minorm_core::{OrmError, OrmResult};

use crate::value::Value;

/// The SQL dialect a statement is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQLite (`AUTOINCREMENT`, double-quoted identifiers).
    SQLite,
    /// MySQL (`AUTO_INCREMENT`, backtick identifiers).
    MySQL,
}

impl Dialect {
    /// Returns the auto-increment column modifier for this dialect.
    pub const fn auto_increment_keyword(self) -> &'static str {
        match self {
            Self::SQLite => "AUTOINCREMENT",
            Self::MySQL => "AUTO_INCREMENT",
        }
    }

    /// Quotes an identifier for this dialect.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::SQLite => format!("\"{ident}\""),
            Self::MySQL => format!("`{ident}`"),
        }
    }
}

/// A generic database row for passing data between backends and the ORM.
///
/// `Row` holds a list of column names and their corresponding values, with
/// typed access via [`get`](Row::get).
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| OrmError::Database(format!("Column '{column}' not found in row")))?;
        T::from_value(&self.values[idx])
    }

    /// Gets a typed value by column index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds or the value cannot be
    /// converted to the requested type.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        if idx >= self.values.len() {
            return Err(OrmError::Database(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            )));
        }
        T::from_value(&self.values[idx])
    }

    /// Returns a reference to the raw value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> OrmResult<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(OrmError::Database(format!("Expected Int, got {value:?}"))),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(i) => Self::try_from(*i)
                .map_err(|e| OrmError::Database(format!("Int value out of i32 range: {e}"))),
            _ => Err(OrmError::Database(format!("Expected Int, got {value:?}"))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as Self),
            _ => Err(OrmError::Database(format!("Expected Float, got {value:?}"))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            // SQLite stores booleans as integers.
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            _ => Err(OrmError::Database(format!("Expected Bool, got {value:?}"))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(OrmError::Database(format!(
                "Expected String, got {value:?}"
            ))),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

/// Compiles schema operations into parameterized SQL for one [`Dialect`].
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler {
    dialect: Dialect,
}

impl SqlCompiler {
    /// Creates a new compiler for the given dialect.
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Returns the dialect this compiler targets.
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Compiles an INSERT statement over the given field values.
    pub fn insert(&self, table: &str, fields: &[(&str, Value)]) -> (String, Vec<Value>) {
        let mut params = Vec::with_capacity(fields.len());
        let columns: Vec<String> = fields
            .iter()
            .map(|(name, _)| self.dialect.quote(name))
            .collect();
        let placeholders: Vec<&str> = fields
            .iter()
            .map(|(_, val)| {
                params.push(val.clone());
                "?"
            })
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.dialect.quote(table),
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, params)
    }

    /// Compiles a single multi-row INSERT statement.
    ///
    /// Every row must have one value per column; rows are flattened into the
    /// parameter list in order.
    pub fn insert_many(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<Value>],
    ) -> (String, Vec<Value>) {
        let quoted: Vec<String> = columns.iter().map(|c| self.dialect.quote(c)).collect();
        let row_template = format!(
            "({})",
            columns.iter().map(|_| "?").collect::<Vec<_>>().join(", ")
        );
        let values_clause: Vec<&str> = rows.iter().map(|_| row_template.as_str()).collect();
        let params: Vec<Value> = rows.iter().flatten().cloned().collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.dialect.quote(table),
            quoted.join(", "),
            values_clause.join(", ")
        );
        (sql, params)
    }

    /// Compiles an UPDATE statement with a conjunctive equality WHERE clause.
    pub fn update(
        &self,
        table: &str,
        set: &[(&str, Value)],
        where_eq: &[(&str, Value)],
    ) -> (String, Vec<Value>) {
        let mut params = Vec::with_capacity(set.len() + where_eq.len());
        let set_parts: Vec<String> = set
            .iter()
            .map(|(name, val)| {
                params.push(val.clone());
                format!("{} = ?", self.dialect.quote(name))
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {} WHERE ",
            self.dialect.quote(table),
            set_parts.join(", ")
        );
        self.push_where_eq(where_eq, &mut sql, &mut params);
        (sql, params)
    }

    /// Compiles a DELETE statement with a conjunctive equality WHERE clause.
    pub fn delete(&self, table: &str, where_eq: &[(&str, Value)]) -> (String, Vec<Value>) {
        let mut params = Vec::with_capacity(where_eq.len());
        let mut sql = format!("DELETE FROM {} WHERE ", self.dialect.quote(table));
        self.push_where_eq(where_eq, &mut sql, &mut params);
        (sql, params)
    }

    /// Compiles a SELECT of every row in the table.
    pub fn select_all(&self, table: &str) -> String {
        format!("SELECT * FROM {}", self.dialect.quote(table))
    }

    /// Compiles a SELECT with a conjunctive equality WHERE clause.
    pub fn select_where(&self, table: &str, where_eq: &[(&str, Value)]) -> (String, Vec<Value>) {
        let mut params = Vec::with_capacity(where_eq.len());
        let mut sql = format!("SELECT * FROM {} WHERE ", self.dialect.quote(table));
        self.push_where_eq(where_eq, &mut sql, &mut params);
        (sql, params)
    }

    /// Compiles a COUNT of every row in the table.
    pub fn count(&self, table: &str) -> String {
        format!(
            "SELECT COUNT(*) AS {} FROM {}",
            self.dialect.quote("count"),
            self.dialect.quote(table)
        )
    }

    /// Compiles a CREATE DATABASE statement.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Unsupported`] on SQLite, where a database is a
    /// file rather than a server object.
    pub fn create_database(&self, name: &str) -> OrmResult<String> {
        match self.dialect {
            Dialect::MySQL => Ok(format!(
                "CREATE DATABASE IF NOT EXISTS {}",
                self.dialect.quote(name)
            )),
            Dialect::SQLite => Err(OrmError::Unsupported(
                "SQLite databases are files; CREATE DATABASE does not apply".to_string(),
            )),
        }
    }

    /// Appends `col = ?` conditions joined by AND. `Null` compiles to
    /// `col IS NULL`, which `=` would never match.
    fn push_where_eq(&self, where_eq: &[(&str, Value)], sql: &mut String, params: &mut Vec<Value>) {
        for (i, (name, val)) in where_eq.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            if val.is_null() {
                sql.push_str(&format!("{} IS NULL", self.dialect.quote(name)));
            } else {
                params.push(val.clone());
                sql.push_str(&format!("{} = ?", self.dialect.quote(name)));
            }
        }
    }
}
