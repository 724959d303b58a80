//! Environment-driven settings for the HTTP binary.

use infrastructure::{MongoSettings, RepositoryConfig};
use std::env;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MONGO_HOST: &str = "localhost";
const DEFAULT_MONGO_PORT: u16 = 27017;
const DEFAULT_MONGO_DATABASE: &str = "travel_db";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown DATABASE_TYPE '{0}' (expected 'memory' or 'mongo')")]
    UnknownBackend(String),
    #[error("Invalid MONGO_PORT '{0}'")]
    InvalidMongoPort(String),
    #[error("MONGO_USERNAME and MONGO_PASSWORD must be set together")]
    PartialCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub repository: RepositoryConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a variable if set.
    /// Blank values count as unset.
    pub fn from_lookup(raw: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| raw(key).filter(|value| !value.trim().is_empty());
        let port = resolve_port(lookup("PORT"));
        let backend = lookup("DATABASE_TYPE").unwrap_or_else(|| "memory".to_string());
        let repository = match backend.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => RepositoryConfig::InMemory,
            "mongo" | "mongodb" => RepositoryConfig::Mongo(mongo_settings(&lookup)?),
            _ => return Err(ConfigError::UnknownBackend(backend)),
        };
        Ok(Self { port, repository })
    }
}

fn resolve_port(value: Option<String>) -> u16 {
    match value {
        Some(port_str) => match port_str.parse::<u16>() {
            Ok(port_num) => {
                info!("Using port {} from environment variable PORT.", port_num);
                port_num
            }
            Err(_) => {
                warn!(
                    "Invalid PORT value '{}' in environment variable. Using default port {}.",
                    port_str, DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        },
        None => {
            info!(
                "PORT environment variable not set. Using default port {}.",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        }
    }
}

fn mongo_settings(lookup: &impl Fn(&str) -> Option<String>) -> Result<MongoSettings, ConfigError> {
    let database =
        lookup("MONGO_DATABASE").unwrap_or_else(|| DEFAULT_MONGO_DATABASE.to_string());
    if let Some(uri) = lookup("MONGO_URI") {
        return Ok(MongoSettings { uri, database });
    }

    let host = lookup("MONGO_HOST").unwrap_or_else(|| DEFAULT_MONGO_HOST.to_string());
    let port = match lookup("MONGO_PORT") {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidMongoPort(raw))?,
        None => DEFAULT_MONGO_PORT,
    };
    let uri = match (lookup("MONGO_USERNAME"), lookup("MONGO_PASSWORD")) {
        (Some(username), Some(password)) => {
            format!("mongodb://{username}:{password}@{host}:{port}")
        }
        (None, None) => format!("mongodb://{host}:{port}"),
        _ => return Err(ConfigError::PartialCredentials),
    };
    Ok(MongoSettings { uri, database })
}
