// Configuration module entry point
// Loads typed configuration and owns the shared application state

mod state;
mod types;

use clap::Parser;
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HealthConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StorageConfig, UploadResponseFormat,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Stores uploaded images and serves them back by name",
    long_about = None
)]
pub struct Args {
    /// Path to configuration file (extension optional, file optional)
    #[arg(short = 'c', long, env = "IMGDROP_CONFIG", default_value = "config")]
    pub config: String,

    /// Validate configuration and exit without starting the server
    #[arg(long)]
    pub validate: bool,
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the config file,
    /// `IMGDROP__SECTION__KEY` environment variables.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("IMGDROP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NamingStrategy;
    use std::io::Write;

    #[test]
    fn test_defaults_match_stock_service() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.storage.dir, "./images");
        assert_eq!(cfg.storage.naming, NamingStrategy::Original);
        assert_eq!(cfg.http.upload_response, UploadResponseFormat::Json);
        assert!(cfg.http.enable_cors);
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "0.0.0.0:8000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load_from("/nonexistent/imgdrop-config").unwrap();
        assert_eq!(cfg.storage.dir, "./images");
        assert_eq!(cfg.health.liveness_path, "/healthz");
    }

    #[test]
    fn test_partial_file_overrides_selected_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n\
             [storage]\nnaming = \"content_length\"\n\n\
             [http]\nenable_cors = false\nupload_response = \"text\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let cfg = Config::load_from(path).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.storage.naming, NamingStrategy::ContentLength);
        assert_eq!(cfg.storage.dir, "./images");
        assert!(!cfg.http.enable_cors);
        assert_eq!(cfg.http.upload_response, UploadResponseFormat::Text);
    }

    #[test]
    fn test_invalid_host_reports_error() {
        let mut cfg = Config::default();
        cfg.server.host = "not an address".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
