//! Auth Service Library
//!
//! Credential verification, token issuance, per-request token checks and
//! revocation. The HTTP layer lives in the gateway crate; everything here is
//! framework independent.

pub mod config;
pub mod gate;
pub mod infra;
pub mod repository;
pub mod revocation;
pub mod service;
pub mod token;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AuthServiceConfig;
use crate::gate::AuthGate;
use crate::infra::Database;
use crate::repository::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use crate::revocation::RevocationRegistry;
use crate::service::{AuthService, Authenticator};
use crate::token::TokenIssuer;
use common::{AppResult, DatabaseConfig};
use domain::PasswordHasher;

/// Composition root for the authentication subsystem.
///
/// Owns the single revocation registry and token issuer of the process and
/// hands shared references to the service and the gate.
#[derive(Clone)]
pub struct AuthModule {
    pub service: Arc<dyn AuthService>,
    pub gate: AuthGate,
    pub revocations: Arc<RevocationRegistry>,
    pub issuer: Arc<TokenIssuer>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AuthModule {
    /// Wire the subsystem around an existing credential store.
    pub fn new(config: &AuthServiceConfig, credentials: Arc<dyn CredentialStore>) -> AppResult<Self> {
        let hasher = PasswordHasher::new(config.password_hash_cost)?;
        let issuer = Arc::new(TokenIssuer::new(config.jwt_secret_bytes()));
        let revocations = Arc::new(RevocationRegistry::new());

        let service: Arc<dyn AuthService> = Arc::new(Authenticator::new(
            Arc::clone(&credentials),
            hasher,
            Arc::clone(&issuer),
            Arc::clone(&revocations),
        ));
        let gate = AuthGate::new(Arc::clone(&issuer), Arc::clone(&revocations));

        Ok(Self {
            service,
            gate,
            revocations,
            issuer,
            credentials,
        })
    }

    /// Wire the subsystem, choosing PostgreSQL when a database is configured
    /// and the in-memory store otherwise.
    pub async fn from_config(config: &AuthServiceConfig) -> AppResult<Self> {
        let credentials: Arc<dyn CredentialStore> = match &config.database {
            Some(database) => {
                let db = Database::connect(database).await?;
                Arc::new(PgCredentialStore::new(db.get_connection()))
            }
            None => {
                warn!("DATABASE_URL not set, credentials are kept in memory and lost on restart");
                Arc::new(MemoryCredentialStore::new())
            }
        };

        Self::new(config, credentials)
    }
}

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Run a migration command against the credential database.
pub async fn run_migrations(database: &DatabaseConfig, action: MigrateAction) -> AppResult<()> {
    let db = Database::connect_without_migrations(database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            for state in db.migration_status().await? {
                let marker = if state.applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, state.name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}
