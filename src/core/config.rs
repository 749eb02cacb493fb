//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup from environment variables
//! (optionally via a `.env` file) and then passed down explicitly.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Cosmos DB account and database.
    pub cosmos: CosmosConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Cosmos DB connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct CosmosConfig {
    /// Account endpoint, e.g. `https://<account>.documents.azure.com:443/`.
    pub endpoint: Option<String>,

    /// Base64 master key.
    pub key: Option<String>,

    /// Database all tools operate on.
    pub database: String,

    /// Container suggested to clients. Every tool call still names its
    /// container explicitly.
    pub default_container: String,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CosmosConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .field("default_container", &self.default_container)
            .finish()
    }
}

impl CosmosConfig {
    /// Whether a master key was provided, phrased for the startup log.
    pub fn credential_status(&self) -> &'static str {
        if self.key.is_some() {
            "Cosmos DB key loaded from environment"
        } else {
            "COSMOSDB_KEY not set - the server cannot authenticate"
        }
    }
}

impl Default for CosmosConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            key: None,
            database: "todos".to_string(),
            default_container: "tasks".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "cosmosdb-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            cosmos: CosmosConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Cosmos DB settings come from `COSMOSDB_URI`, `COSMOSDB_KEY`,
    /// `COSMOS_DATABASE_ID` and `COSMOS_CONTAINER_ID`; server settings use
    /// the `MCP_` prefix (`MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, ...).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env();

        config.cosmos.endpoint = non_empty_var("COSMOSDB_URI");
        config.cosmos.key = non_empty_var("COSMOSDB_KEY");

        if let Some(database) = non_empty_var("COSMOS_DATABASE_ID") {
            config.cosmos.database = database;
        }
        if let Some(container) = non_empty_var("COSMOS_CONTAINER_ID") {
            config.cosmos.default_container = container;
        }

        config
    }

    /// Log what was loaded, without secrets.
    ///
    /// Call after logging is initialized; `from_env` runs before a
    /// subscriber exists.
    pub fn log_summary(&self) {
        info!(
            "Using Cosmos DB database '{}' (default container '{}')",
            self.cosmos.database, self.cosmos.default_container
        );
        if self.cosmos.key.is_some() {
            info!("{}", self.cosmos.credential_status());
        } else {
            warn!("{}", self.cosmos.credential_status());
        }
    }

    /// Check that everything needed to reach the store is present.
    pub fn validate(&self) -> Result<()> {
        if self.cosmos.endpoint.is_none() {
            return Err(Error::config("COSMOSDB_URI must be set"));
        }
        if self.cosmos.key.is_none() {
            return Err(Error::config("COSMOSDB_KEY must be set"));
        }
        if self.cosmos.database.trim().is_empty() {
            return Err(Error::config("COSMOS_DATABASE_ID must not be empty"));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = [
        "COSMOSDB_URI",
        "COSMOSDB_KEY",
        "COSMOS_DATABASE_ID",
        "COSMOS_CONTAINER_ID",
    ];

    fn clear_vars() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_cosmos_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_vars();
        unsafe {
            std::env::set_var("COSMOSDB_URI", "https://acct.documents.azure.com:443/");
            std::env::set_var("COSMOSDB_KEY", "a2V5");
            std::env::set_var("COSMOS_DATABASE_ID", "inventory");
        }

        let config = Config::from_env();
        assert_eq!(
            config.cosmos.endpoint.as_deref(),
            Some("https://acct.documents.azure.com:443/")
        );
        assert_eq!(config.cosmos.key.as_deref(), Some("a2V5"));
        assert_eq!(config.cosmos.database, "inventory");
        assert_eq!(config.cosmos.default_container, "tasks");
        assert!(config.validate().is_ok());

        clear_vars();
    }

    #[test]
    fn test_defaults_and_validation() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_vars();

        let config = Config::from_env();
        assert_eq!(config.cosmos.database, "todos");
        assert_eq!(config.cosmos.default_container, "tasks");

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("COSMOSDB_URI"));
    }

    #[test]
    fn test_missing_key_fails_validation() {
        let config = Config {
            cosmos: CosmosConfig {
                endpoint: Some("https://acct.documents.azure.com".into()),
                ..CosmosConfig::default()
            },
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("COSMOSDB_KEY"));
    }

    #[test]
    fn test_credential_status() {
        let mut cosmos = CosmosConfig::default();
        assert_eq!(
            cosmos.credential_status(),
            "COSMOSDB_KEY not set - the server cannot authenticate"
        );

        cosmos.key = Some("super_secret_key".to_string());
        let status = cosmos.credential_status();
        assert_eq!(status, "Cosmos DB key loaded from environment");
        assert!(!status.contains("super_secret_key"));
    }

    #[test]
    fn test_key_redacted_in_debug() {
        let cosmos = CosmosConfig {
            key: Some("super_secret_key".to_string()),
            ..CosmosConfig::default()
        };
        let debug_str = format!("{:?}", cosmos);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }
}
