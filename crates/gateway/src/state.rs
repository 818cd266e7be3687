//! Application state for dependency injection.

use std::sync::Arc;

use auth_service_lib::gate::AuthGate;
use auth_service_lib::repository::CredentialStore;
use auth_service_lib::revocation::RevocationRegistry;
use auth_service_lib::service::AuthService;
use auth_service_lib::AuthModule;

use crate::config::GatewayConfig;
use crate::middleware::RateLimiter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub auth_gate: AuthGate,
    pub revocations: Arc<RevocationRegistry>,
    pub credentials: Arc<dyn CredentialStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub auth_rate_limiter: Arc<RateLimiter>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state from the wired auth subsystem.
    pub fn new(auth: AuthModule, config: GatewayConfig) -> Self {
        Self {
            auth_service: auth.service,
            auth_gate: auth.gate,
            revocations: auth.revocations,
            credentials: auth.credentials,
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            auth_rate_limiter: Arc::new(RateLimiter::new(config.auth_rate_limit)),
            config,
        }
    }

    /// Drop expired revocation entries and closed rate-limit windows.
    pub fn sweep(&self) -> SweepReport {
        SweepReport {
            revocations: self.revocations.purge_expired(),
            rate_limit_windows: self.rate_limiter.purge_expired()
                + self.auth_rate_limiter.purge_expired(),
        }
    }
}

/// Counts of entries removed by one [`AppState::sweep`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub revocations: usize,
    pub rate_limit_windows: usize,
}
