//! Gateway configuration.

use std::time::Duration;

use common::{env_opt, env_parse_or, AppError, AppResult, RateLimitConfig, ServerConfig};

/// Default window for both rate limiters (15 minutes)
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 15 * 60;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    /// Limit applied to every `/api` request per client
    pub rate_limit: RateLimitConfig,
    /// Stricter limit for `/api/auth` routes
    pub auth_rate_limit: RateLimitConfig,
    /// How often expired revocation entries and idle rate-limit windows are dropped
    pub sweep_interval: Duration,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP` instead of the peer address.
    /// Only enable behind a reverse proxy that overwrites these headers.
    pub trust_proxy_headers: bool,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            server: ServerConfig {
                host: env_opt("HOST").unwrap_or(defaults.server.host),
                port: env_parse_or("PORT", defaults.server.port)?,
            },
            rate_limit: RateLimitConfig::new(
                env_parse_or("RATE_LIMIT_REQUESTS", defaults.rate_limit.max_requests)?,
                env_parse_or("RATE_LIMIT_WINDOW_SECONDS", defaults.rate_limit.window_seconds)?,
            ),
            auth_rate_limit: RateLimitConfig::new(
                env_parse_or("RATE_LIMIT_AUTH_REQUESTS", defaults.auth_rate_limit.max_requests)?,
                env_parse_or(
                    "RATE_LIMIT_AUTH_WINDOW_SECONDS",
                    defaults.auth_rate_limit.window_seconds,
                )?,
            ),
            sweep_interval: Duration::from_secs(env_parse_or(
                "REVOCATION_SWEEP_INTERVAL_SECONDS",
                defaults.sweep_interval.as_secs(),
            )?),
            trust_proxy_headers: env_parse_or(
                "TRUST_PROXY_HEADERS",
                defaults.trust_proxy_headers,
            )?,
        };

        if config.sweep_interval.is_zero() {
            return Err(AppError::configuration(
                "REVOCATION_SWEEP_INTERVAL_SECONDS must be greater than zero",
            ));
        }

        Ok(config)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::new(100, DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
            auth_rate_limit: RateLimitConfig::new(3, DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
            sweep_interval: Duration::from_secs(300),
            trust_proxy_headers: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.rate_limit, RateLimitConfig::new(100, 900));
        assert_eq!(config.auth_rate_limit, RateLimitConfig::new(3, 900));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert!(!config.trust_proxy_headers);
    }
}
