//! Connection settings.
//!
//! Loaded from a TOML file, a TOML string, or the standard libpq environment
//! variables (with `.env` support):
//!
//! ```toml
//! host = "localhost"
//! port = 5432
//! username = "gamer"
//! password = "secret"
//! database = "gamers"
//! echo = true
//! ```

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::path::Path;

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    pub host: String,
    pub port: u16,
    #[serde(alias = "user")]
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "dbname")]
    pub database: Option<String>,
    /// Log every executed statement at `INFO`.
    pub echo: bool,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: None,
            password: None,
            database: None,
            echo: false,
        }
    }
}

impl ConnectConfig {
    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::connection(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw).map_err(|e| {
            OrmError::connection(format!("{} ({})", e, path.display()))
        })
    }

    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        toml::from_str(raw)
            .map_err(|e| OrmError::connection(format!("failed to parse connection config: {e}")))
    }

    /// Build from `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`, `PGDATABASE` and
    /// `PGTABLE_ECHO`, after loading `.env` if present.
    pub fn from_env() -> OrmResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let mut config = Self::default();
        if let Some(host) = var("PGHOST") {
            config.host = host;
        }
        if let Some(port) = var("PGPORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| OrmError::connection(format!("invalid PGPORT: {port:?}")))?;
        }
        config.username = var("PGUSER");
        config.password = var("PGPASSWORD");
        config.database = var("PGDATABASE");
        if let Some(echo) = var("PGTABLE_ECHO") {
            config.echo = parse_flag(&echo).ok_or_else(|| {
                OrmError::connection(format!("invalid PGTABLE_ECHO: {echo:?}"))
            })?;
        }
        Ok(config)
    }

    /// The equivalent tokio-postgres configuration.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(self.host.as_str())
            .port(self.port)
            .application_name("pgtable");
        if let Some(user) = &self.username {
            config.user(user.as_str());
        }
        if let Some(password) = &self.password {
            config.password(password.as_str());
        }
        if let Some(database) = &self.database {
            config.dbname(database.as_str());
        }
        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
