//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Default minimum distance between two bank placements in one world
pub const DEFAULT_MIN_SEPARATION: f64 = 5.0;

/// Default radius within which a placement can be interacted with / removed
pub const DEFAULT_INTERACTION_RADIUS: f64 = 2.0;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL; in-memory stores are used when absent
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Environment (development, production)
    pub environment: String,

    /// Bank placement geometry
    pub registry: RegistrySettings,
}

/// Distances governing bank placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistrySettings {
    /// Placements in the same world must be at least this far apart
    pub min_separation: f64,

    /// A query point this close to a placement can remove it
    pub interaction_radius: f64,
}

impl RegistrySettings {
    /// Validated settings: `0 < interaction_radius < min_separation`.
    pub fn new(min_separation: f64, interaction_radius: f64) -> Result<Self, ConfigError> {
        if !min_separation.is_finite() || min_separation <= 0.0 {
            return Err(ConfigError::InvalidValue("BANK_MIN_SEPARATION"));
        }
        if !interaction_radius.is_finite()
            || interaction_radius <= 0.0
            || interaction_radius >= min_separation
        {
            return Err(ConfigError::InvalidValue("BANK_INTERACTION_RADIUS"));
        }

        Ok(Self {
            min_separation,
            interaction_radius,
        })
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            min_separation: DEFAULT_MIN_SEPARATION,
            interaction_radius: DEFAULT_INTERACTION_RADIUS,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any name-to-value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let database_max_connections = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let registry = RegistrySettings::new(
            parse_var(&lookup, "BANK_MIN_SEPARATION", DEFAULT_MIN_SEPARATION)?,
            parse_var(&lookup, "BANK_INTERACTION_RADIUS", DEFAULT_INTERACTION_RADIUS)?,
        )?;

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            registry,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
