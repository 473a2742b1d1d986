//! Configuration loading
//!
//! Resolution order, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`COLORI_*`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing config file is not fatal: a warning is logged and defaults are
//! used. Missing API keys are reported by [`Config::validate`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_CONFIG_PATH: &str = "COLORI_CONFIG";
pub const ENV_HOST: &str = "COLORI_HOST";
pub const ENV_PORT: &str = "COLORI_PORT";
pub const ENV_DATABASE_PATH: &str = "COLORI_DATABASE_PATH";
pub const ENV_LOG_LEVEL: &str = "COLORI_LOG_LEVEL";
pub const ENV_GEMINI_API_KEY: &str = "COLORI_GEMINI_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "COLORI_OPENAI_API_KEY";
pub const ENV_IDENTITY_SECRET_KEY: &str = "COLORI_IDENTITY_SECRET_KEY";
pub const ENV_CDN_API_SECRET: &str = "COLORI_CDN_API_SECRET";

/// Complete service configuration, as read from `colori.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite database file; defaults to the platform data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub image: ImageConfig,

    /// Image CDN; when absent generated images are served from the generator's URL
    #[serde(default)]
    pub cdn: Option<CdnConfig>,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    /// Return a fixed hosted outfit image
    #[default]
    Placeholder,
    /// Generate with the OpenAI images API
    OpenAi,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub provider: ImageProvider,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_image_quality")]
    pub quality: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: ImageProvider::default(),
            openai_api_key: None,
            model: default_image_model(),
            size: default_image_size(),
            quality: default_image_quality(),
            base_url: default_openai_base_url(),
            placeholder_url: default_placeholder_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CdnConfig {
    pub cloud_name: String,
    pub api_key: String,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default = "default_cdn_folder")]
    pub folder: String,
    #[serde(default = "default_cdn_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
    /// `public_metadata.role` value that grants admin access
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            base_url: default_identity_base_url(),
            admin_role: default_admin_role(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Largest accepted decoded selfie
    #[serde(default = "default_max_selfie_bytes")]
    pub max_selfie_bytes: usize,
    /// Timeout for calls to external services
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_selfie_bytes: default_max_selfie_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1792".to_string()
}

fn default_image_quality() -> String {
    "hd".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_placeholder_url() -> String {
    "https://res.cloudinary.com/dtxmgotbr/image/upload/v1750092887/colori/outfits/a1b98ghz1kjzqj2mbenq.png"
        .to_string()
}

fn default_cdn_folder() -> String {
    "colori/outfits".to_string()
}

fn default_cdn_base_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_identity_base_url() -> String {
    "https://api.clerk.com".to_string()
}

fn default_admin_role() -> String {
    "admin".to_string()
}

fn default_max_selfie_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Command-line values that override everything else
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Resolve configuration from CLI, environment, TOML file and defaults
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let config_path = cli
            .config_path
            .clone()
            .or_else(|| std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let mut config = match config_path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using defaults and environment",
                    path.display()
                );
                Self::default()
            }
            None => {
                warn!("No config directory available, using defaults and environment");
                Self::default()
            }
        };

        config.apply_env();
        config.apply_cli(cli);
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply `COLORI_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply environment-style overrides from an arbitrary lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|v| is_valid_key(v)) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid {}={}", ENV_PORT, port),
            }
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|v| is_valid_key(v)) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| is_valid_key(v)) {
            self.logging.level = level;
        }
        if let Some(key) = lookup(ENV_GEMINI_API_KEY).filter(|v| is_valid_key(v)) {
            self.gemini.api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_OPENAI_API_KEY).filter(|v| is_valid_key(v)) {
            self.image.openai_api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_IDENTITY_SECRET_KEY).filter(|v| is_valid_key(v)) {
            self.identity.secret_key = Some(key);
        }
        if let Some(secret) = lookup(ENV_CDN_API_SECRET).filter(|v| is_valid_key(v)) {
            match self.cdn.as_mut() {
                Some(cdn) => cdn.api_secret = Some(secret),
                None => warn!("{} set but no [cdn] section configured", ENV_CDN_API_SECRET),
            }
        }
    }

    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(path) = &cli.database_path {
            self.database_path = Some(path.clone());
        }
    }

    /// Check that every credential the configured services need is present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if !self.gemini.api_key.as_deref().is_some_and(is_valid_key) {
            missing.push(format!("gemini.api_key ({})", ENV_GEMINI_API_KEY));
        }
        if !self.identity.secret_key.as_deref().is_some_and(is_valid_key) {
            missing.push(format!("identity.secret_key ({})", ENV_IDENTITY_SECRET_KEY));
        }
        if self.image.provider == ImageProvider::OpenAi
            && !self.image.openai_api_key.as_deref().is_some_and(is_valid_key)
        {
            missing.push(format!("image.openai_api_key ({})", ENV_OPENAI_API_KEY));
        }
        if let Some(cdn) = &self.cdn {
            if !cdn.api_secret.as_deref().is_some_and(is_valid_key) {
                missing.push(format!("cdn.api_secret ({})", ENV_CDN_API_SECRET));
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "Missing required settings: {}. Set them in colori.toml or the environment.",
                missing.join(", ")
            )))
        }
    }

    /// Database file, falling back to the platform data directory
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// `~/.config/colori/colori.toml` (or the platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("colori").join("colori.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("colori"))
        .unwrap_or_else(|| PathBuf::from("./colori_data"))
        .join("colori.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5780);
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.image.provider, ImageProvider::Placeholder);
        assert_eq!(config.identity.admin_role, "admin");
        assert!(config.cdn.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9000

            [gemini]
            api_key = "g-key"

            [image]
            provider = "openai"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.image.provider, ImageProvider::OpenAi);
        assert_eq!(config.image.size, "1024x1792");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("server = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides_toml() {
        let mut config = Config::from_toml_str("[gemini]\napi_key = \"from-toml\"").unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_GEMINI_API_KEY, "from-env"),
            (ENV_PORT, "7000"),
            (ENV_IDENTITY_SECRET_KEY, "   "),
        ]
        .into_iter()
        .collect();

        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.gemini.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.server.port, 7000);
        // Blank values are ignored
        assert!(config.identity.secret_key.is_none());
    }

    #[test]
    fn test_invalid_port_env_ignored() {
        let mut config = Config::default();
        config.apply_env_from(|name| (name == ENV_PORT).then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 5780);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = Config::default();
        config.apply_env_from(|name| (name == ENV_PORT).then(|| "7000".to_string()));
        config.apply_cli(&CliOverrides {
            port: Some(8000),
            database_path: Some(PathBuf::from("/tmp/x.db")),
            ..Default::default()
        });
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.resolved_database_path(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_validate_reports_missing_keys() {
        let err = Config::default().validate().unwrap_err().to_string();
        assert!(err.contains("gemini.api_key"));
        assert!(err.contains("identity.secret_key"));
        assert!(!err.contains("openai"));
    }

    #[test]
    fn test_validate_requires_openai_key_for_openai_provider() {
        let mut config = Config::default();
        config.gemini.api_key = Some("g".to_string());
        config.identity.secret_key = Some("sk".to_string());
        assert!(config.validate().is_ok());

        config.image.provider = ImageProvider::OpenAi;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("image.openai_api_key"));
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("  \t"));
    }
}
