//! Connection configuration shared by every backend.

use std::sync::Arc;

use minorm_core::{DatabaseSettings, OrmError, OrmResult};
use minorm_db::{DbExecutor, Dialect};

/// Connection parameters for any supported backend.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub dialect: Dialect,
    /// The database name, or file path for SQLite.
    pub name: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DatabaseConfig {
    /// Configuration for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self::sqlite_file(":memory:")
    }

    /// Configuration for a SQLite file database.
    pub fn sqlite_file(path: impl Into<String>) -> Self {
        Self {
            dialect: Dialect::SQLite,
            name: path.into(),
            host: None,
            port: None,
            user: None,
            password: None,
        }
    }

    /// Configuration for a MySQL database.
    pub fn mysql(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            dialect: Dialect::MySQL,
            name: name.into(),
            host: Some(host.into()),
            port: Some(port),
            user: Some(user.into()),
            password: Some(password.into()),
        }
    }
}

impl TryFrom<&DatabaseSettings> for DatabaseConfig {
    type Error = OrmError;

    fn try_from(settings: &DatabaseSettings) -> OrmResult<Self> {
        match settings.vendor.as_str() {
            "sqlite" => Ok(Self::sqlite_file(settings.name.clone())),
            "mysql" => Ok(Self {
                dialect: Dialect::MySQL,
                name: settings.name.clone(),
                host: settings.host.clone(),
                port: settings.port,
                user: settings.user.clone(),
                password: settings.password.clone(),
            }),
            other => Err(OrmError::ImproperlyConfigured(format!(
                "unknown database vendor '{other}'"
            ))),
        }
    }
}

/// Opens the backend named by the configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established or the
/// corresponding backend feature is not compiled in.
pub fn connect(config: &DatabaseConfig) -> OrmResult<Arc<dyn DbExecutor>> {
    match config.dialect {
        #[cfg(feature = "sqlite")]
        Dialect::SQLite => Ok(Arc::new(crate::sqlite::SqliteBackend::open(
            config.name.clone(),
        )?)),
        #[cfg(feature = "mysql")]
        Dialect::MySQL => Ok(Arc::new(crate::mysql::MySqlBackend::from_config(config)?)),
        #[allow(unreachable_patterns)]
        other => Err(OrmError::ImproperlyConfigured(format!(
            "support for {other:?} is not compiled in"
        ))),
    }
}
