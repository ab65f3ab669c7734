//! Command-line and environment configuration.

use crate::error::{AppError, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// VIN import service - loads VIN CSV files, decodes them and serves the results
#[derive(Parser, Debug, Clone)]
#[command(name = "vin-backend")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Interface to bind the HTTP server to
    #[arg(long, env = "VIN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "VIN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path to the SQLite database file
    #[arg(short, long, env = "VIN_DATABASE", default_value = "vins.sqlite")]
    pub database: PathBuf,

    /// Base URL of the external VIN decode API
    #[arg(long, env = "VIN_API_BASE_URL")]
    pub api_base_url: String,

    /// Directory holding one sub-directory per import container
    #[arg(long, env = "VIN_IMPORT_ROOT", default_value = "./blobs")]
    pub import_root: PathBuf,

    /// Number of records processed per concurrent batch
    #[arg(long, env = "VIN_BATCH_SIZE", default_value_t = 40)]
    pub batch_size: usize,

    /// Timeout for a single decode request, in seconds
    #[arg(long, env = "VIN_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Variable catalog JSON overriding the built-in one
    #[arg(long, env = "VIN_VARIABLES")]
    pub variables: Option<PathBuf>,
}

impl Config {
    /// Rejects settings the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(AppError::Config("batch size must be greater than zero".into()));
        }
        reqwest::Url::parse(&self.api_base_url).map_err(|e| {
            AppError::Config(format!("invalid API base URL '{}': {}", self.api_base_url, e))
        })?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
