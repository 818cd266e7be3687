//! Per-request token check, independent of any HTTP framework.

use std::sync::Arc;

use uuid::Uuid;

use crate::revocation::RevocationRegistry;
use crate::token::TokenIssuer;
use common::{AppError, AppResult};
use domain::BEARER_TOKEN_PREFIX;

/// Identity attached to a request after its token passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedContext {
    pub subject_id: Uuid,
    /// Raw bearer token, kept so signout can revoke it
    pub token: String,
}

/// Decides whether a request's bearer token is acceptable.
#[derive(Debug, Clone)]
pub struct AuthGate {
    issuer: Arc<TokenIssuer>,
    revocations: Arc<RevocationRegistry>,
}

impl AuthGate {
    pub fn new(issuer: Arc<TokenIssuer>, revocations: Arc<RevocationRegistry>) -> Self {
        Self {
            issuer,
            revocations,
        }
    }

    /// Check an `Authorization` header value.
    ///
    /// Order matters: the revocation check runs before signature
    /// verification, so a revoked token reports `TokenRevoked` even if it
    /// has also expired.
    ///
    /// # Errors
    /// - `MissingToken` when the header is absent, not a Bearer credential, or empty
    /// - `TokenRevoked` when the token is in the revocation registry
    /// - `InvalidToken` when the signature or expiry check fails
    pub fn authorize(&self, authorization: Option<&str>) -> AppResult<AuthenticatedContext> {
        let token = bearer_token(authorization).ok_or(AppError::MissingToken)?;

        if self.revocations.contains(token) {
            tracing::debug!("Rejected revoked token");
            return Err(AppError::TokenRevoked);
        }

        let claims = self.issuer.verify(token)?;

        Ok(AuthenticatedContext {
            subject_id: claims.sub,
            token: token.to_string(),
        })
    }
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
