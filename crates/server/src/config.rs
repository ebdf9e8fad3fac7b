//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOP_PUBLIC_URL` - Public base URL used to build invoice download links
//!
//! ## Optional
//! - `SHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - Listen port (default: 5000)
//! - `INVOICES_DIR` - Directory for rendered invoice PDFs (default: invoices)
//! - `CLEAN_INVOICE_FILES` - Delete invoice files after dispatch (default: false)
//! - `SELLER_NAME` - Shop name on invoices and emails (default: Electro World)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! ## Optional, required for checkout to succeed
//! - `SELLER_EMAIL` - Seller copy of order notifications
//! - `SELLER_PHONE` - Seller WhatsApp number for the order handoff deep link
//! - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `EMAIL_FROM` -
//!   Mail transport. When `SMTP_HOST` is unset the transport is disabled and
//!   checkout responds with a configuration error; when it is set, the
//!   remaining variables are required so a half-configured mailer fails at
//!   startup instead of at the first order.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use electroworld_core::Email;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for invoice links, without a trailing slash
    pub public_url: String,
    /// Directory where rendered invoices are written and served from
    pub invoices_dir: PathBuf,
    /// Delete invoice files after the order email is dispatched
    pub clean_invoice_files: bool,
    /// Seller identity used on invoices, emails, and the WhatsApp handoff
    pub seller: SellerConfig,
    /// SMTP transport configuration, absent when the mailer is disabled
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Seller identity and contact points.
///
/// `email` and `phone` are optional at startup; the checkout path surfaces
/// their absence as a configuration error, not a validation error.
#[derive(Debug, Clone)]
pub struct SellerConfig {
    /// Shop name shown on invoices and in email subjects
    pub name: String,
    /// Seller address copied on every order notification
    pub email: Option<Email>,
    /// Seller WhatsApp number for the manual order-confirmation deep link
    pub phone: Option<String>,
}

/// SMTP transport configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ShopConfig {
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

        let database_url = get_database_url("SHOP_DATABASE_URL")?;
        let host = get_env_or_default("SHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("SHOP_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_PORT".to_owned(), e.to_string()))?;
        let public_url = get_required_env("SHOP_PUBLIC_URL")?
            .trim_end_matches('/')
            .to_owned();
        let invoices_dir = PathBuf::from(get_env_or_default("INVOICES_DIR", "invoices"));
        let clean_invoice_files = get_env_or_default("CLEAN_INVOICE_FILES", "false") == "true";

        let seller = SellerConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            public_url,
            invoices_dir,
            clean_invoice_files,
            seller,
            email,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SellerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = match get_optional_env("SELLER_EMAIL") {
            Some(raw) => Some(
                Email::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("SELLER_EMAIL".to_owned(), e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            name: get_env_or_default("SELLER_NAME", "Electro World"),
            email,
            phone: get_optional_env("SELLER_PHONE"),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_owned(), e.to_string()))?;

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
impl ShopConfig {
    /// A config pointing at a disposable invoices directory, with no mailer
    /// and no seller contact configured.
    pub(crate) fn for_tests(invoices_dir: PathBuf) -> Self {
        Self {
            database_url: SecretString::from("postgres://unused"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            public_url: "http://localhost:5000".to_owned(),
            invoices_dir,
            clean_invoice_files: false,
            seller: SellerConfig {
                name: "Electro World".to_owned(),
                email: None,
                phone: None,
            },
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}
