//! Database settings loading.
//!
//! [`DatabaseSettings`] captures the connection parameters an application
//! supplies through configuration rather than code. Settings can be built
//! directly, or loaded from a TOML string or file:
//!
//! ```
//! use minorm_core::settings::DatabaseSettings;
//!
//! let settings = DatabaseSettings::from_toml_str(
//!     r#"
//!     vendor = "sqlite"
//!     name = ":memory:"
//!     log_level = "debug"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(settings.vendor, "sqlite");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, OrmResult};

/// Connection and logging settings for a database.
///
/// `vendor` selects the backend ("sqlite" or "mysql"); the remaining fields
/// mirror the usual driver connection parameters. Fields not present in the
/// TOML keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The backend vendor: "sqlite" or "mysql".
    pub vendor: String,
    /// The database name, or the file path / ":memory:" for SQLite.
    pub name: String,
    /// The database host, for network backends.
    pub host: Option<String>,
    /// The database port.
    pub port: Option<u16>,
    /// The database user.
    pub user: Option<String>,
    /// The database password.
    pub password: Option<String>,
    /// The log level directive passed to [`crate::logging::setup_logging`].
    pub log_level: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            vendor: "sqlite".to_string(),
            name: ":memory:".to_string(),
            host: None,
            port: None,
            user: None,
            password: None,
            log_level: "info".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Loads settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Configuration`] if the TOML is malformed.
    pub fn from_toml_str(toml_str: &str) -> OrmResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| OrmError::Configuration(format!("Failed to parse TOML: {e}")))
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Configuration`] if the file cannot be read or the
    /// TOML is malformed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> OrmResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            OrmError::Configuration(format!(
                "Failed to read TOML file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }
}
