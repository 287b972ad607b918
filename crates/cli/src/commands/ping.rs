//! API reachability check.
//!
//! # Environment Variables
//!
//! - `SELLAPP_API_URL` - Base URL of the POS API
//! - `SELLAPP_API_BASE_PATH` - Optional path prefix
//! - `SELLAPP_API_TOKEN` - Service bearer token

use thiserror::Error;

use sellapp_web::api::{ApiClient, ApiError};
use sellapp_web::config::{ApiConfig, ConfigError};

/// Errors that can occur during a ping.
#[derive(Debug, Error)]
pub enum PingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Carries the message a cashier would see.
    #[error("{message} ({source})")]
    Api { message: String, source: ApiError },
}

impl From<ApiError> for PingError {
    fn from(source: ApiError) -> Self {
        Self::Api {
            message: source.user_message(),
            source,
        }
    }
}

/// Call the products endpoint with the configured token.
///
/// # Errors
///
/// Returns the configuration problem or the classified API failure.
#[allow(clippy::print_stdout)]
pub async fn run() -> Result<(), PingError> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    tracing::info!(api = %config.url, "Pinging POS API");

    let client = ApiClient::new(&config)?;
    client.ping().await?;

    println!("POS API at {} is reachable", config.url);
    Ok(())
}
