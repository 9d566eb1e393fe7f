//! Configuration system for the BIQ server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (port, database, mode, logging)
//! 2. .env file - secrets (API keys)
//!
//! Environment variables always override config.yaml values.

use biq_core::CatalogSource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Acquisition mode: "autonomous" (synthesized SQL) or "catalog"
    pub mode: String,

    /// Path to the DuckDB database file
    pub database: String,

    /// Directory holding the catalog SQL files
    pub sql_dir: String,

    /// Directory chart images are written to
    pub charts_dir: String,

    /// Reasoning model name
    pub model: String,

    /// Per-call timeout for reasoning requests, in seconds
    pub timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: "autonomous".to_string(),
            database: "./data/ecommerce.db".to_string(),
            sql_dir: "./sql_queries".to_string(),
            charts_dir: "./visualizations".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        if let Ok(host) = std::env::var("BIQ_SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("BIQ_SERVER_PORT") {
            if let Ok(port_num) = port.parse() {
                config.server.port = port_num;
            }
        }

        if let Ok(mode) = std::env::var("BIQ_PIPELINE_MODE") {
            config.pipeline.mode = mode;
        }
        if let Ok(db) = std::env::var("BIQ_DB_PATH") {
            config.pipeline.database = db;
        }
        if let Ok(dir) = std::env::var("BIQ_SQL_DIR") {
            config.pipeline.sql_dir = dir;
        }
        if let Ok(dir) = std::env::var("BIQ_CHARTS_DIR") {
            config.pipeline.charts_dir = dir;
        }
        if let Ok(model) = std::env::var("BIQ_MODEL") {
            config.pipeline.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            config.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.logging.directory = dir;
        }

        Ok(config)
    }

    /// Get OpenAI API key from environment (must be in .env)
    pub fn get_openai_api_key() -> Result<String, ConfigError> {
        std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }

    /// The fixed catalog sources, resolved against the configured SQL
    /// directory. Index assignment follows this order for the process
    /// lifetime.
    pub fn catalog_sources(&self) -> Vec<CatalogSource> {
        let dir = Path::new(&self.pipeline.sql_dir);
        vec![
            CatalogSource::new("Top Customers", dir.join("customer_analytics.sql"), 1),
            CatalogSource::new("Churn Risk", dir.join("customer_analytics.sql"), 2),
            CatalogSource::new("Customer Geography", dir.join("customer_analytics.sql"), 3),
            CatalogSource::new("Monthly Revenue", dir.join("revenue_analytics.sql"), 1),
            CatalogSource::new("Category Revenue", dir.join("revenue_analytics.sql"), 2),
            CatalogSource::new("State Revenue", dir.join("revenue_analytics.sql"), 3),
            CatalogSource::new("Best Products", dir.join("product_analytics.sql"), 1),
            CatalogSource::new("Category Performance", dir.join("product_analytics.sql"), 2),
            CatalogSource::new("Delivery Performance", dir.join("operational_analytics.sql"), 1),
            CatalogSource::new("Seller Performance", dir.join("operational_analytics.sql"), 2),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pipeline.mode, "autonomous");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stdout");
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("BIQ_SERVER_PORT", "9090");
        std::env::set_var("BIQ_PIPELINE_MODE", "catalog");

        let config_yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
pipeline:
  mode: "autonomous"
  database: "./data/ecommerce.db"
  sql_dir: "./sql_queries"
  charts_dir: "./visualizations"
  model: "gpt-4o-mini"
  timeout_secs: 30
logging:
  level: "info"
  format: "pretty"
  output: "stdout"
  directory: "./logs"
"#;
        let temp_file = std::env::temp_dir().join("biq_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.server.port, 9090); // Overridden
        assert_eq!(config.pipeline.mode, "catalog"); // Overridden

        std::env::remove_var("BIQ_SERVER_PORT");
        std::env::remove_var("BIQ_PIPELINE_MODE");
        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_catalog_sources_are_ordered() {
        let sources = Config::default().catalog_sources();
        assert_eq!(sources.len(), 10);
        assert_eq!(sources[0].name, "Top Customers");
        assert_eq!(sources[3].name, "Monthly Revenue");
    }
}
