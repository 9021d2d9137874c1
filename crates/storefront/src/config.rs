//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WHATSAPP_ORDER_NUMBER` - Destination number for order hand-offs
//!   (digits with optional punctuation; validated at point of use, not here)
//! - `MENU_SHEET_CSV_URL` - CSV export URL of the menu spreadsheet
//! - `CONVERSION_API_URL` - Base URL of the daily conversion rate API
//! - `CLOUDINARY_CLOUD_NAME` - Cloud identifier for receipt image uploads
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CLOUDINARY_UPLOAD_PRESET` - Unsigned upload preset (default: comprobantes)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Destination WhatsApp number for order hand-offs.
    ///
    /// Treated as an opaque string here; the order composer validates it at
    /// the point of use so a configuration defect surfaces as a normal order
    /// error instead of preventing startup.
    pub whatsapp_number: String,
    /// CSV export URL of the menu spreadsheet
    pub menu_csv_url: String,
    /// Base URL of the conversion rate API
    pub conversion_api_url: String,
    /// Receipt upload configuration
    pub cloudinary: CloudinaryConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Cloudinary unsigned-upload configuration for payment receipts.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// Cloud identifier (part of the upload URL)
    pub cloud_name: String,
    /// Unsigned upload preset the receipts are filed under
    pub upload_preset: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            whatsapp_number: get_required_env("WHATSAPP_ORDER_NUMBER")?,
            menu_csv_url: get_required_env("MENU_SHEET_CSV_URL")?,
            conversion_api_url: get_required_env("CONVERSION_API_URL")?,
            cloudinary: CloudinaryConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
            upload_preset: get_env_or_default("CLOUDINARY_UPLOAD_PRESET", "comprobantes"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
