//! Authentication service - signup, signin and signout.
//!
//! SOLID (SRP): Handles authentication concerns only. Persistence is behind
//! [`CredentialStore`], hashing behind [`PasswordHasher`], tokens behind
//! [`TokenIssuer`] and revocation behind [`RevocationRegistry`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::repository::CredentialStore;
use crate::revocation::RevocationRegistry;
use crate::token::{IssuedToken, TokenIssuer};
use common::{AppError, AppResult};
use domain::{Credential, CredentialResponse, Password, PasswordHasher, TOKEN_TYPE_BEARER};

/// Result of a successful signup or signin.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    /// Signed bearer token
    pub token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: CredentialResponse,
}

impl AuthSession {
    fn new(issued: IssuedToken, credential: &Credential) -> Self {
        Self {
            expires_in: issued.expires_in(),
            token: issued.token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            user: CredentialResponse::from(credential),
        }
    }
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and log it in
    async fn signup(&self, email: String, password: String) -> AppResult<AuthSession>;

    /// Check credentials and issue a fresh token
    async fn signin(&self, email: String, password: String) -> AppResult<AuthSession>;

    /// Revoke a token. Never fails, whatever the token.
    fn signout(&self, token: &str);
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: Arc<TokenIssuer>,
    revocations: Arc<RevocationRegistry>,
}

impl Authenticator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        issuer: Arc<TokenIssuer>,
        revocations: Arc<RevocationRegistry>,
    ) -> Self {
        Self {
            credentials,
            hasher,
            issuer,
            revocations,
        }
    }

    async fn hash_password(&self, password: String) -> AppResult<Password> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {}", e)))?
            .map_err(AppError::from)
    }

    /// Verify against the stored hash, or against the decoy when there is no
    /// credential, so both paths cost one full verification.
    async fn verify_password(&self, password: String, stored: Option<Password>) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || match stored {
            Some(hash) => hasher.verify(&password, &hash),
            None => hasher.verify_decoy(&password),
        })
        .await
        .map_err(|e| AppError::internal(format!("Verification task failed: {}", e)))
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn signup(&self, email: String, password: String) -> AppResult<AuthSession> {
        tracing::info!(email = %email, "Registration attempt");

        if self.credentials.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailInUse);
        }

        let password_hash = self.hash_password(password).await?;

        // The store rejects a racing duplicate with EmailInUse
        let credential = self
            .credentials
            .create_and_save(email, password_hash.into_string())
            .await?;

        let issued = self.issuer.issue(credential.id)?;
        tracing::info!(user_id = %credential.id, "Account registered");

        Ok(AuthSession::new(issued, &credential))
    }

    async fn signin(&self, email: String, password: String) -> AppResult<AuthSession> {
        tracing::info!(email = %email, "Login attempt");

        let credential = self.credentials.find_by_email(&email).await?;
        let stored = credential.as_ref().map(Credential::password);

        let valid = self.verify_password(password, stored).await?;

        let credential = match credential {
            Some(credential) if valid => credential,
            _ => return Err(AppError::InvalidCredentials),
        };

        let issued = self.issuer.issue(credential.id)?;
        Ok(AuthSession::new(issued, &credential))
    }

    fn signout(&self, token: &str) {
        tracing::info!("Signing out");
        self.revocations.add(token);
    }
}
