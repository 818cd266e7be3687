//! Shared configuration structures and environment helpers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

// Connection strings usually embed a password
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u64,
    /// Window size in seconds
    pub window_seconds: u64,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u64, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(100, 900)
    }
}

/// Read an optional environment variable, treating blank values as unset.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back to `default` when unset.
///
/// A value that is present but unparsable is a configuration error rather
/// than a silent fallback.
pub fn env_parse_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::configuration(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_database_debug_redacts_url() {
        let config = DatabaseConfig::new("postgres://app:hunter2@db/app");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_env_parse_or() {
        std::env::set_var("COMMON_TEST_PORT", "4100");
        std::env::set_var("COMMON_TEST_BAD", "abc");

        assert_eq!(env_parse_or::<u16>("COMMON_TEST_PORT", 1).unwrap(), 4100);
        assert_eq!(env_parse_or::<u16>("COMMON_TEST_MISSING", 7).unwrap(), 7);
        assert!(matches!(
            env_parse_or::<u16>("COMMON_TEST_BAD", 1),
            Err(AppError::Configuration(_))
        ));
    }
}
