use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_DB_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct Config {
    /// `DB_NAME`: path of the database file.
    pub database_path: String,
    /// `DB_VERSION`: schema version tag seeded into a fresh database.
    pub db_version: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn new(database_path: impl Into<String>, db_version: u32) -> Self {
        Config {
            database_path: database_path.into(),
            db_version,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DB_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("DB_NAME".to_string()))?;

        let db_version = match env_map.get("DB_VERSION") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue(
                    "DB_VERSION".to_string(),
                    "must be a valid u32".to_string(),
                )
            })?,
            None => DEFAULT_DB_VERSION,
        };

        Ok(Config {
            database_path,
            db_version,
        })
    }

    /// Look up a recognised setting by its environment name.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "DB_NAME" => Some(Value::from(self.database_path.clone())),
            "DB_VERSION" => Some(Value::from(self.db_version)),
            _ => None,
        }
    }
}
