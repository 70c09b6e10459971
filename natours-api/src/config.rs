//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following
//! precedence (highest to lowest):
//! 1. Environment variables (prefix: NATOURS_, sections split on `__`,
//!    e.g. `NATOURS_AUTH__JWT_SECRET`)
//! 2. Current working directory: ./config.toml
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// SMTP configuration (optional; emails are logged when absent)
    #[serde(default)]
    pub email: Option<EmailConfig>,

    /// Checkout configuration
    #[serde(default)]
    pub payments: PaymentsConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Public base URL used in emails and checkout redirects
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret for JWTs
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Token lifetime in days
    #[serde(default = "default_jwt_expires_in_days")]
    pub jwt_expires_in_days: u64,

    /// Minimum accepted password length
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,

    /// How long a password reset token stays valid, in minutes
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_minutes: u64,
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS mode: permissive or restrictive
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            cors_mode: default_cors_mode(),
        }
    }
}

/// SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP server host
    pub smtp_host: String,

    /// SMTP server port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username (empty disables authentication, for dev relays)
    #[serde(default)]
    pub smtp_user: String,

    /// SMTP password
    #[serde(default)]
    pub smtp_password: String,

    /// From address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From display name
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

/// Checkout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// ISO currency code the checkout charges in
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Shared secret the webhook caller signs requests with
    #[serde(default = "default_webhook_secret")]
    pub webhook_secret: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            webhook_secret: default_webhook_secret(),
        }
    }
}

// Default value functions
fn default_service_name() -> String {
    "natours-api".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_jwt_secret() -> String {
    // Dev-only; production deployments must override via NATOURS_AUTH__JWT_SECRET
    "insecure-dev-only-secret-change-me".to_string()
}

fn default_jwt_expires_in_days() -> u64 {
    90
}

fn default_password_min_length() -> usize {
    8
}

fn default_reset_token_ttl() -> u64 {
    10
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "hello@natours.dev".to_string()
}

fn default_from_name() -> String {
    "Natours".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_webhook_secret() -> String {
    "insecure-dev-only-webhook-secret".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// `./config.toml` (if present) overrides defaults; `NATOURS_`-prefixed
    /// environment variables override everything.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file
    ///
    /// Useful for testing or non-standard deployments.
    pub fn load_from(path: &str) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("NATOURS_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Whether the service runs with production expectations
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.service.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: default_service_name(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
                public_url: default_public_url(),
            },
            auth: AuthConfig {
                jwt_secret: default_jwt_secret(),
                jwt_expires_in_days: default_jwt_expires_in_days(),
                password_min_length: default_password_min_length(),
                reset_token_ttl_minutes: default_reset_token_ttl(),
            },
            middleware: MiddlewareConfig::default(),
            email: None,
            payments: PaymentsConfig::default(),
        }
    }
}
