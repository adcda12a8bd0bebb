//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication and OTP configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this portal.
    pub url: String,
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Take the client IP from `X-Forwarded-For`/`X-Real-IP`.
    /// Enable only when a reverse proxy sets those headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// One-time password and session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Seconds an issued OTP stays valid.
    #[serde(default = "default_otp_ttl_secs")]
    pub otp_ttl_secs: i64,
    /// Wrong guesses allowed before a challenge is burned.
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: i32,
    /// Pins every issued OTP to this value. Demo and test deployments only.
    #[serde(default)]
    pub otp_fixed_code: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            otp_ttl_secs: default_otp_ttl_secs(),
            otp_max_attempts: default_otp_max_attempts(),
            otp_fixed_code: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_otp_ttl_secs() -> i64 {
    300
}

const fn default_otp_max_attempts() -> i32 {
    5
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CYBERGUARD_ENV`)
    /// 3. Environment variables with `CYBERGUARD__` prefix
    ///
    /// A `.env` file in the working directory is read into the process
    /// environment first, if present.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("CYBERGUARD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CYBERGUARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CYBERGUARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                url = "http://localhost:3000"

                [database]
                url = "postgres://localhost/cyberguard"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(!config.server.trust_proxy);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.auth.otp_ttl_secs, 300);
        assert_eq!(config.auth.otp_max_attempts, 5);
        assert!(config.auth.otp_fixed_code.is_none());
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_json_log_format() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                url = "http://localhost:3000"
                trust_proxy = true

                [database]
                url = "postgres://localhost/cyberguard"

                [log]
                format = "json"

                [auth]
                otp_ttl_secs = 60
                otp_fixed_code = "123456"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.server.trust_proxy);
        assert_eq!(config.auth.otp_ttl_secs, 60);
        assert_eq!(config.auth.otp_fixed_code.as_deref(), Some("123456"));
    }
}
