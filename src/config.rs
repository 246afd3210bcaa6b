use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, Context};

/// Where user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local table, lost on restart. Handy for local runs and tests.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let storage = match get("STORAGE_BACKEND") {
            Some(v) => v.parse::<StorageBackend>().context("STORAGE_BACKEND")?,
            None => StorageBackend::Postgres,
        };
        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres storage backend");
        }
        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse::<u32>().context("DB_MAX_CONNECTIONS")?,
            None => 10,
        };
        let port = match get("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT")?,
            None => 8080,
        };
        Ok(Self {
            storage,
            database_url,
            db_max_connections,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// In-memory configuration used by tests.
    #[cfg(test)]
    pub fn memory() -> Self {
        Self {
            storage: StorageBackend::Memory,
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn postgres_is_default_and_needs_database_url() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let cfg = config(&[("DATABASE_URL", "postgres://localhost/accounts")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Postgres);
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = config(&[
            ("STORAGE_BACKEND", "Memory"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "3000"),
        ])
        .unwrap();
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("STORAGE_BACKEND", "sqlite")]).is_err());
        assert!(config(&[("STORAGE_BACKEND", "memory"), ("APP_PORT", "http")]).is_err());
        assert!(config(&[
            ("DATABASE_URL", "postgres://localhost/accounts"),
            ("DB_MAX_CONNECTIONS", "-1"),
        ])
        .is_err());
    }
}
