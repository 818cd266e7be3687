//! Password value object and Argon2id hasher.
//!
//! DDD: Encapsulates password hashing as a domain value object.
//! The hasher owns the tunable cost so every hash in the process is
//! produced with the same configuration.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::constants::{MIN_PASSWORD_LENGTH, PASSWORD_HASH_MEMORY_KIB, PASSWORD_HASH_PARALLELISM};
use crate::error::{DomainError, DomainResult};

/// Hashed password value object.
///
/// Holds only the PHC-formatted hash string, never the plain text.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a Password from an existing hash (from storage).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}

/// Salted Argon2id hasher with a configurable iteration count.
///
/// Besides hashing and verifying, it keeps a decoy hash computed with the
/// same parameters. Verifying against the decoy costs exactly as much as a
/// real verification, which lets callers spend identical time whether or not
/// an account exists.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    cost: u32,
    decoy: Password,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish()
    }
}

impl PasswordHasher {
    /// Create a hasher with the given Argon2 iteration count.
    ///
    /// # Errors
    /// Returns a password error if the cost is rejected by Argon2 (e.g. zero).
    pub fn new(cost: u32) -> DomainResult<Self> {
        let params = Params::new(PASSWORD_HASH_MEMORY_KIB, cost, PASSWORD_HASH_PARALLELISM, None)
            .map_err(|e| DomainError::password(format!("Invalid hash parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let decoy_input = SaltString::generate(&mut OsRng);
        let decoy = Self::hash_with(&argon2, decoy_input.as_str())?;

        Ok(Self {
            argon2,
            cost,
            decoy,
        })
    }

    /// Iteration count this hasher was built with.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plain text password with a fresh random salt.
    ///
    /// # Errors
    /// Returns a validation error if the password is shorter than
    /// [`MIN_PASSWORD_LENGTH`].
    pub fn hash(&self, plain_text: &str) -> DomainResult<Password> {
        if plain_text.len() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        Self::hash_with(&self.argon2, plain_text)
    }

    /// Verify a plain text password against a stored hash.
    ///
    /// A malformed stored hash is a verification failure, not an error, and
    /// costs a full decoy verification like any other failure.
    pub fn verify(&self, plain_text: &str, stored: &Password) -> bool {
        match PasswordHash::new(stored.as_str()) {
            Ok(parsed) => self.matches(plain_text, &parsed),
            Err(_) => self.verify_decoy(plain_text),
        }
    }

    /// Run a full verification against the decoy hash and report failure.
    pub fn verify_decoy(&self, plain_text: &str) -> bool {
        if let Ok(parsed) = PasswordHash::new(self.decoy.as_str()) {
            let _ = self.matches(plain_text, &parsed);
        }
        false
    }

    fn matches(&self, plain_text: &str, parsed: &PasswordHash<'_>) -> bool {
        self.argon2
            .verify_password(plain_text.as_bytes(), parsed)
            .is_ok()
    }

    fn hash_with(argon2: &Argon2<'static>, plain_text: &str) -> DomainResult<Password> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::password(format!("Password hash failed: {}", e)))?;
        Ok(Password::from_hash(hash.to_string()))
    }
}
