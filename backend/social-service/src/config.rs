/// Configuration management for Social Service
///
/// Loads configuration from environment variables (a `.env` file is read by `main`).
/// Pool tuning lives in `db_pool::DbConfig`.
use anyhow::{bail, Context, Result};
use db_pool::env_utils::{env_string_or, parse_env_with_default};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DEFAULT_CORS_ORIGINS: &str = "http://127.0.0.1:8000,http://localhost:8000,null";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageBackend,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    pub http_port: u16,
}

/// Where users, content and edges are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL via `DATABASE_URL`
    Postgres,
    /// Process memory; data is lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown STORAGE_BACKEND '{}', expected postgres or memory", other),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact origins; `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// RS256 key pair in PEM form
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub private_key_pem: String,
    pub public_key_pem: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("private_key_pem", &"[REDACTED]")
            .field("public_key_pem", &format!("{} bytes", self.public_key_pem.len()))
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: env_string_or("APP_ENV", "development"),
            host: env_string_or("APP_HOST", "0.0.0.0"),
            http_port: parse_env_with_default("PORT", 8000),
        };

        let storage = env_string_or("STORAGE_BACKEND", "postgres")
            .parse::<StorageBackend>()?;

        let cors = CorsConfig {
            allowed_origins: env_string_or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS)
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        };

        let (private_key_pem, public_key_pem) =
            crypto_core::jwt::load_keys_from_env().context("JWT key pair is required")?;

        Ok(Config {
            app,
            storage,
            cors,
            jwt: JwtConfig {
                private_key_pem,
                public_key_pem,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "PORT",
            "STORAGE_BACKEND",
            "CORS_ALLOWED_ORIGINS",
        ] {
            std::env::remove_var(key);
        }
        std::env::set_var(crypto_core::jwt::PRIVATE_KEY_ENV, "private");
        std::env::set_var(crypto_core::jwt::PUBLIC_KEY_ENV, "public");
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8000);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://127.0.0.1:8000", "http://localhost:8000", "null"]
        );
        assert!(!config.cors.allows_any());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("PORT", "9100");
        std::env::set_var("STORAGE_BACKEND", "Memory");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://agora.dev, *");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.http_port, 9100);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.cors.allowed_origins, vec!["https://agora.dev", "*"]);
        assert!(config.cors.allows_any());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_storage_backend_is_an_error() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "sqlite");

        assert!(Config::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_jwt_keys_required() {
        clear_env();
        std::env::remove_var(crypto_core::jwt::PRIVATE_KEY_ENV);

        assert!(Config::from_env().is_err());

        clear_env();
    }
}
