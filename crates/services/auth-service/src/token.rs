//! Signed bearer token issuance and verification (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{SECONDS_PER_HOUR, TOKEN_LIFETIME_HOURS};

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: Uuid,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Unique token id
    pub jti: Uuid,
}

impl Claims {
    /// Claims for a token issued to `subject` right now.
    pub fn for_subject(subject: Uuid) -> Self {
        let now = Utc::now();
        Self {
            sub: subject,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

/// A freshly signed token together with the claims it encodes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    /// Seconds from issuance until expiry
    pub fn expires_in(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

/// Why a token failed verification.
///
/// Callers outside this module see both as [`AppError::InvalidToken`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        tracing::debug!(reason = %err, "Token rejected");
        AppError::InvalidToken
    }
}

/// Issues and verifies HS256 tokens with a key fixed at construction.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &Algorithm::HS256)
            .field("lifetime_hours", &TOKEN_LIFETIME_HOURS)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Token lifetime in seconds
    pub fn lifetime(&self) -> i64 {
        TOKEN_LIFETIME_HOURS * SECONDS_PER_HOUR
    }

    /// Issue a token for `subject`, valid for exactly the token lifetime.
    pub fn issue(&self, subject: Uuid) -> AppResult<IssuedToken> {
        let claims = Claims::for_subject(subject);
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token signing failed: {}", e)))
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        // jsonwebtoken accepts exp == now; a token is only valid strictly before exp
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

/// Read the `exp` claim without checking the signature.
///
/// Only for bookkeeping such as deciding when a revocation entry can be
/// dropped; never for authorization.
pub fn peek_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<ExpiryOnly>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims.exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET)
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let subject = Uuid::new_v4();
        let issued = issuer.issue(subject).unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims, issued.claims);
    }

    #[test]
    fn test_expiry_is_exactly_one_lifetime_after_issue() {
        let issued = issuer().issue(Uuid::new_v4()).unwrap();

        assert_eq!(issued.claims.exp - issued.claims.iat, 24 * 3600);
        assert_eq!(issued.expires_in(), issuer().lifetime());
    }

    #[test]
    fn test_same_subject_same_second_gives_distinct_tokens() {
        let issuer = issuer();
        let subject = Uuid::new_v4();

        let a = issuer.issue(subject).unwrap();
        let b = issuer.issue(subject).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 100,
            exp: now - 10,
            jti: Uuid::new_v4(),
        };
        let token = issuer.sign(&claims).unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_at_exact_expiry_rejected() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 100,
            exp: now,
            jti: Uuid::new_v4(),
        };
        let token = issuer.sign(&claims).unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_other_key_rejected() {
        let token = TokenIssuer::new(b"ffffffffffffffffffffffffffffffff")
            .issue(Uuid::new_v4())
            .unwrap()
            .token;

        assert!(matches!(issuer().verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = issuer();
        let token = issuer.issue(Uuid::new_v4()).unwrap().token;
        let other = issuer.issue(Uuid::new_v4()).unwrap().token;

        // Splice the payload of one token onto the signature of another
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(issuer.verify(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(issuer().verify("not-a-jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(issuer().verify(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_token_error_maps_to_invalid_token() {
        assert!(matches!(AppError::from(TokenError::Expired), AppError::InvalidToken));
        assert!(matches!(
            AppError::from(TokenError::Invalid("x".into())),
            AppError::InvalidToken
        ));
    }

    #[test]
    fn test_peek_expiry() {
        let issued = issuer().issue(Uuid::new_v4()).unwrap();

        assert_eq!(peek_expiry(&issued.token), Some(issued.claims.exp));
        assert_eq!(peek_expiry("garbage"), None);
    }

    #[test]
    fn test_peek_expiry_ignores_signature() {
        let foreign = TokenIssuer::new(b"ffffffffffffffffffffffffffffffff")
            .issue(Uuid::new_v4())
            .unwrap();

        assert_eq!(peek_expiry(&foreign.token), Some(foreign.claims.exp));
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", issuer());
        assert!(!debug.contains("0123456789abcdef"));
    }
}
