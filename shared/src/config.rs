//! Configuration management for the check service and the code generator

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Smallest image that still fits a version 1 code (21x21 modules).
const MIN_IMAGE_SIZE: u32 = 21;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub invitations: InvitationConfig,
    pub generator: GeneratorConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Number of valid invitation ids, numbered 1..=capacity
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub output_dir: String,
    pub count: u32,
    pub image_size: u32,
    pub margin: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub log_level: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://invitations.db?mode=rwc".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            idle_timeout_seconds: 300,
            max_lifetime_seconds: 1800,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/check".to_string(),
            output_dir: "qrcodes".to_string(),
            count: 300,
            image_size: 300,
            margin: 1,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_defaults = DatabaseConfig::default();
        let gen_defaults = GeneratorConfig::default();

        let capacity: u32 = parse_or(&lookup, "INVITATION_CAPACITY", 300)?;

        let config = Config {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or(db_defaults.url),
                max_connections: parse_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    db_defaults.max_connections,
                )?,
                min_connections: parse_or(
                    &lookup,
                    "DATABASE_MIN_CONNECTIONS",
                    db_defaults.min_connections,
                )?,
                acquire_timeout_seconds: parse_or(
                    &lookup,
                    "DATABASE_ACQUIRE_TIMEOUT_SECONDS",
                    db_defaults.acquire_timeout_seconds,
                )?,
                idle_timeout_seconds: parse_or(
                    &lookup,
                    "DATABASE_IDLE_TIMEOUT_SECONDS",
                    db_defaults.idle_timeout_seconds,
                )?,
                max_lifetime_seconds: parse_or(
                    &lookup,
                    "DATABASE_MAX_LIFETIME_SECONDS",
                    db_defaults.max_lifetime_seconds,
                )?,
            },
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 3000)?,
            },
            invitations: InvitationConfig { capacity },
            generator: GeneratorConfig {
                base_url: lookup("QR_BASE_URL").unwrap_or(gen_defaults.base_url),
                output_dir: lookup("QR_OUTPUT_DIR").unwrap_or(gen_defaults.output_dir),
                count: parse_or(&lookup, "QR_COUNT", capacity)?,
                image_size: parse_or(&lookup, "QR_IMAGE_SIZE", gen_defaults.image_size)?,
                margin: parse_or(&lookup, "QR_MARGIN", gen_defaults.margin)?,
            },
            app: AppConfig {
                environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.invitations.capacity == 0 {
            return Err(AppError::configuration("INVITATION_CAPACITY must be at least 1"));
        }
        if self.generator.count == 0 {
            return Err(AppError::configuration("QR_COUNT must be at least 1"));
        }
        if self.generator.image_size < MIN_IMAGE_SIZE {
            return Err(AppError::configuration(format!(
                "QR_IMAGE_SIZE must be at least {} pixels",
                MIN_IMAGE_SIZE
            )));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::configuration("DATABASE_MAX_CONNECTIONS must be at least 1"));
        }
        Ok(())
    }

    /// Production logs go to collectors, so they are written without ANSI colours.
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::configuration(format!("{} has invalid value {:?}: {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_match_single_venue_deployment() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.invitations.capacity, 300);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.generator.count, 300);
        assert_eq!(config.generator.output_dir, "qrcodes");
        assert_eq!(config.generator.base_url, "http://localhost:3000/check");
        assert!(config.database.url.starts_with("sqlite:"));
        assert_eq!(config.app.environment, "development");
        assert!(!config.is_production());

        let config = config_from(&[("ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_count_follows_capacity_unless_overridden() {
        let config = config_from(&[("INVITATION_CAPACITY", "50")]).unwrap();
        assert_eq!(config.generator.count, 50);

        let config = config_from(&[("INVITATION_CAPACITY", "50"), ("QR_COUNT", "3")]).unwrap();
        assert_eq!(config.invitations.capacity, 50);
        assert_eq!(config.generator.count, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("INVITATION_CAPACITY", "0")]).is_err());
        assert!(config_from(&[("QR_IMAGE_SIZE", "10")]).is_err());
    }
}
