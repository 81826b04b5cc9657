// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

use crate::storage::NamingStrategy;

/// Main configuration structure
///
/// Every section falls back to its `Default`, so an absent config file yields
/// the stock service: port 8000, storage in `./images`, CORS on.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding every uploaded image (flat namespace)
    pub dir: String,
    /// How the stored filename is derived from an upload
    pub naming: NamingStrategy,
    /// Base URL embedded in plain-text upload confirmations
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: "./images".to_string(),
            naming: NamingStrategy::default(),
            public_base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `error`, `warn`, `info`, `debug`
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds in-flight connections get to finish after a shutdown signal
    pub shutdown_grace_period: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
            shutdown_grace_period: 10,
        }
    }
}

/// Body of a successful upload response
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadResponseFormat {
    /// `{"filename": "<name>"}`
    #[default]
    Json,
    /// Plain-text confirmation embedding the retrieval URL
    Text,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
    pub upload_response: UploadResponseFormat,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: "imgdrop".to_string(),
            enable_cors: true,
            max_body_size: 10_485_760, // 10MB
            upload_response: UploadResponseFormat::default(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HealthConfig {
    /// Enable health check endpoints
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    pub readiness_path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            liveness_path: "/healthz".to_string(),
            readiness_path: "/readyz".to_string(),
        }
    }
}
