//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.

pub mod rules;
pub mod secrets;

use crate::error::{Error, Result};
use secrecy::SecretString;

pub use rules::RuleSet;

#[derive(Debug)]
pub struct Config {
    /// Postgres holding the work queue, reports and tracking events.
    pub database_url: SecretString,
    /// Read replica of the Nexus database, used for employee lookups.
    pub nexus_database_url: SecretString,
    pub nexus: NexusConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

/// Credentials and endpoints for the Nexus REST API.
#[derive(Debug)]
pub struct NexusConfig {
    pub instance: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub base_url: String,
    pub token_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let instance = required_var("NEXUS_INSTANCE")?;
        let base_url = std::env::var("NEXUS_BASE_URL").unwrap_or_else(|_| {
            format!("https://{instance}.nexus.kmd.dk/api/core/mobile/{instance}/v2/")
        });
        let token_url = std::env::var("NEXUS_TOKEN_URL").unwrap_or_else(|_| {
            format!("https://iam.nexus.kmd.dk/authx/realms/{instance}/protocol/openid-connect/token")
        });

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            nexus_database_url: SecretString::from(required_var("NEXUS_DATABASE_URL")?),
            nexus: NexusConfig {
                client_id: required_var("NEXUS_CLIENT_ID")?,
                client_secret: SecretString::from(required_var("NEXUS_CLIENT_SECRET")?),
                instance,
                base_url,
                token_url,
            },
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}
