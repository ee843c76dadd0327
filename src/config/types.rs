// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enable_cors: bool,
    pub max_body_size: u64,
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Storage layout configuration
///
/// Collection files live directly under `data_dir`; uploaded document files
/// live under `data_dir`/`upload_dir`.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: String,
    pub upload_dir: String,
    pub documents_file: String,
    pub employees_file: String,
}

impl StorageConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn uploads_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.upload_dir)
    }

    pub fn documents_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.documents_file)
    }

    pub fn employees_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.employees_file)
    }

    /// Public URL path for a stored upload, e.g. `/uploads/report.pdf`.
    pub fn upload_url(&self, file_name: &str) -> String {
        format!("/{}/{}", self.upload_dir.trim_matches('/'), file_name)
    }
}
