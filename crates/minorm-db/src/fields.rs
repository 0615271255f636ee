//! Field definitions: per-column type, validation, and DDL generation.
//!
//! A [`FieldDef`] describes one column of a table: its [`FieldKind`], its
//! constraints, and its modifiers (primary key, unique, auto increment,
//! default). Values are checked and normalized through [`FieldDef::clean`]
//! before they are stored on a record, and [`FieldDef::ddl`] renders the
//! column's fragment of a CREATE TABLE statement.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use minorm_core::{OrmError, OrmResult};

use crate::sql::Dialect;
use crate::value::Value;

/// The semantic type of a field, determining its SQL column type and its
/// validation rules.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldKind {
    /// 64-bit signed integer with an inclusive value range.
    Integer {
        /// Minimum accepted value.
        min: i64,
        /// Maximum accepted value.
        max: i64,
    },
    /// 64-bit floating-point number, optionally with MySQL-style
    /// `(total_digits, decimal_places)` precision.
    Double {
        /// Optional `(m, d)` precision rendered into the column type.
        precision: Option<(u32, u32)>,
    },
    /// Variable-length string with a maximum byte length.
    VarChar {
        /// Maximum accepted length.
        max_length: usize,
    },
    /// Boolean (true/false; the integers 0 and 1 are coerced).
    Boolean,
    /// Date without time, stored as `YYYY-MM-DD`.
    Date,
    /// Date and time, stored as `YYYY-MM-DD HH:MM:SS`.
    DateTime,
    /// Unix-timestamp-convertible date and time, stored as
    /// `YYYY-MM-DD HH:MM:SS`.
    Timestamp,
}

impl FieldKind {
    /// Returns the SQL column type for this kind.
    pub fn column_type(&self) -> String {
        match self {
            Self::Integer { .. } => "INTEGER".to_string(),
            Self::Double { precision } => precision.map_or_else(
                || "DOUBLE".to_string(),
                |(m, d)| format!("DOUBLE({m}, {d})"),
            ),
            Self::VarChar { max_length } => format!("VARCHAR({max_length})"),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Date => "DATE".to_string(),
            Self::DateTime => "DATETIME".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
        }
    }
}

/// Complete definition of a table column.
///
/// Constructed through the kind-specific constructors and the builder
/// methods:
///
/// ```
/// use minorm_db::fields::FieldDef;
///
/// let id = FieldDef::integer("id").primary_key().auto_increment();
/// let username = FieldDef::varchar("username", 32).unique();
/// ```
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The column name.
    pub name: &'static str,
    /// The semantic type of this field.
    pub kind: FieldKind,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether the column value is assigned by the database on insert.
    pub auto_increment: bool,
    /// Whether a UNIQUE constraint is applied.
    pub unique: bool,
    /// Default value rendered into the DDL.
    pub default: Option<Value>,
}

impl FieldDef {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            primary_key: false,
            auto_increment: false,
            unique: false,
            default: None,
        }
    }

    /// Creates an integer field accepting the full `i64` range.
    pub const fn integer(name: &'static str) -> Self {
        Self::new(
            name,
            FieldKind::Integer {
                min: i64::MIN,
                max: i64::MAX,
            },
        )
    }

    /// Creates a floating-point field.
    pub const fn double(name: &'static str) -> Self {
        Self::new(name, FieldKind::Double { precision: None })
    }

    /// Creates a string field with the given maximum length.
    pub const fn varchar(name: &'static str, max_length: usize) -> Self {
        Self::new(name, FieldKind::VarChar { max_length })
    }

    /// Creates a boolean field.
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Creates a date field.
    pub const fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    /// Creates a date-time field.
    pub const fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    /// Creates a timestamp field.
    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldKind::Timestamp)
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks this field as database-assigned on insert.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks this field as having a UNIQUE constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value rendered into the DDL.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts an integer field to an inclusive value range.
    ///
    /// Has no effect on non-integer fields.
    #[must_use]
    pub const fn range(mut self, min: i64, max: i64) -> Self {
        if let FieldKind::Integer { .. } = self.kind {
            self.kind = FieldKind::Integer { min, max };
        }
        self
    }

    /// Sets MySQL-style `(m, d)` precision on a double field.
    ///
    /// Has no effect on non-double fields.
    #[must_use]
    pub const fn precision(mut self, m: u32, d: u32) -> Self {
        if let FieldKind::Double { .. } = self.kind {
            self.kind = FieldKind::Double {
                precision: Some((m, d)),
            };
        }
        self
    }

    /// Validates a candidate value and normalizes it to its stored form.
    ///
    /// Dates and date-times normalize to their string forms; timestamps
    /// additionally accept unix seconds. `Null` is accepted for
    /// auto-increment fields and for any non-primary-key field.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] on a type mismatch, an
    /// out-of-range integer, an over-long string, or a malformed
    /// date/time value.
    pub fn clean(&self, value: Value) -> OrmResult<Value> {
        if value.is_null() {
            if self.auto_increment || !self.primary_key {
                return Ok(Value::Null);
            }
            return Err(OrmError::validation(
                self.name,
                "null",
                "primary key value may not be NULL",
            ));
        }

        match &self.kind {
            FieldKind::Integer { min, max } => match value {
                Value::Int(i) if (*min..=*max).contains(&i) => Ok(Value::Int(i)),
                Value::Int(i) => Err(OrmError::validation(
                    self.name,
                    "out_of_range",
                    format!("value {i} is outside [{min}, {max}]"),
                )),
                other => Err(self.type_error("integer", &other)),
            },
            FieldKind::Double { .. } => match value {
                Value::Float(f) => Ok(Value::Float(f)),
                Value::Int(i) => Ok(Value::Float(i as f64)),
                Value::String(s) => s.parse::<f64>().map(Value::Float).map_err(|_| {
                    OrmError::validation(
                        self.name,
                        "invalid",
                        format!("cannot interpret '{s}' as a double"),
                    )
                }),
                other => Err(self.type_error("double", &other)),
            },
            FieldKind::VarChar { max_length } => match value {
                // VARCHAR(n) limits characters, not bytes.
                Value::String(s) if s.chars().count() <= *max_length => Ok(Value::String(s)),
                Value::String(s) => Err(OrmError::validation(
                    self.name,
                    "max_length",
                    format!(
                        "string of length {} exceeds maximum {max_length}",
                        s.chars().count()
                    ),
                )),
                other => Err(self.type_error("string", &other)),
            },
            FieldKind::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                Value::Int(0) => Ok(Value::Bool(false)),
                Value::Int(1) => Ok(Value::Bool(true)),
                Value::Int(i) => Err(OrmError::validation(
                    self.name,
                    "invalid",
                    format!("only 0 or 1 coerce to boolean, got {i}"),
                )),
                other => Err(self.type_error("boolean", &other)),
            },
            FieldKind::Date => match value {
                Value::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
                Value::String(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                    Ok(_) => Ok(Value::String(s)),
                    Err(_) => Err(OrmError::validation(
                        self.name,
                        "invalid",
                        format!("invalid date '{s}', expected YYYY-MM-DD"),
                    )),
                },
                other => Err(self.type_error("date", &other)),
            },
            FieldKind::DateTime => match value {
                Value::DateTime(dt) => {
                    Ok(Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
                }
                Value::String(s) => parse_datetime(&s).map_or_else(
                    || {
                        Err(OrmError::validation(
                            self.name,
                            "invalid",
                            format!("invalid datetime '{s}', expected YYYY-MM-DD HH:MM:SS"),
                        ))
                    },
                    |dt| Ok(Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
                ),
                other => Err(self.type_error("datetime", &other)),
            },
            FieldKind::Timestamp => match value {
                Value::DateTime(dt) => {
                    Ok(Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
                }
                Value::Int(secs) => DateTime::from_timestamp(secs, 0).map_or_else(
                    || {
                        Err(OrmError::validation(
                            self.name,
                            "out_of_range",
                            format!("{secs} is not a representable unix timestamp"),
                        ))
                    },
                    |dt| {
                        Ok(Value::String(
                            dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
                        ))
                    },
                ),
                Value::String(s) => parse_datetime(&s).map_or_else(
                    || {
                        Err(OrmError::validation(
                            self.name,
                            "invalid",
                            format!("invalid timestamp '{s}', expected unix seconds or YYYY-MM-DD HH:MM:SS"),
                        ))
                    },
                    |dt| Ok(Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
                ),
                other => Err(self.type_error("timestamp", &other)),
            },
        }
    }

    /// Renders this column's DDL fragment: name, SQL type, and modifiers.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ImproperlyConfigured`] if the default value is of
    /// a kind that cannot be rendered into DDL (anything but an integer,
    /// float, or boolean).
    pub fn ddl(&self, dialect: Dialect) -> OrmResult<String> {
        let mut parts = vec![self.name.to_string(), self.kind.column_type()];
        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if let Some(default) = &self.default {
            match default {
                Value::Int(i) => parts.push(format!("DEFAULT {i}")),
                Value::Float(f) => parts.push(format!("DEFAULT {f}")),
                Value::Bool(b) => {
                    parts.push(format!("DEFAULT {}", if *b { "TRUE" } else { "FALSE" }));
                }
                other => {
                    return Err(OrmError::ImproperlyConfigured(format!(
                        "field '{}' has an unsupported default value type: {other:?}",
                        self.name
                    )))
                }
            }
        }
        if self.unique {
            parts.push("UNIQUE".to_string());
        }
        if self.auto_increment {
            parts.push(dialect.auto_increment_keyword().to_string());
        }
        Ok(parts.join(" "))
    }

    fn type_error(&self, expected: &str, got: &Value) -> OrmError {
        OrmError::validation(
            self.name,
            "type",
            format!("expected {expected}, got {got:?}"),
        )
    }
}

/// Parses a datetime string in `YYYY-MM-DD HH:MM:SS` form, with either a
/// space or a `T` separator and optional fractional seconds.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}
