//! Configuration for the ContentFlow client.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the client.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub identity: IdentityConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity provider connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity provider project.
    pub base_url: String,
    /// Public API key sent with every identity request.
    pub anon_key: String,
    /// Application origin used as the redirect target of email links.
    #[serde(default)]
    pub site_url: Option<String>,
}

/// Generation provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
}

/// Payment workflow webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    #[serde(default = "default_webhook_base")]
    pub webhook_base: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            webhook_base: default_webhook_base(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_webhook_base() -> String {
    "https://n8n.yourdomain.com/webhook".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (CONTENTFLOW__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("generation.base_url", default_generation_base_url())?
            .set_default("generation.model", default_generation_model())?
            .set_default("payments.webhook_base", default_webhook_base())?
            .set_default("logging.level", default_log_level())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("CONTENTFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
