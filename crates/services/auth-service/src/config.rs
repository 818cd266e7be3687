//! Auth service configuration.

use common::{env_opt, env_parse_or, AppError, AppResult, DatabaseConfig};
use domain::{DEFAULT_PASSWORD_HASH_COST, MIN_JWT_SECRET_LENGTH};

/// Auth service configuration.
#[derive(Clone)]
pub struct AuthServiceConfig {
    /// HMAC key for signing tokens (min 32 bytes)
    pub jwt_secret: String,
    /// Argon2 iteration count for new password hashes
    pub password_hash_cost: u32,
    /// Credential database; `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,
}

impl std::fmt::Debug for AuthServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServiceConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("password_hash_cost", &self.password_hash_cost)
            .field("database", &self.database)
            .finish()
    }
}

impl AuthServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns a configuration error if `JWT_SECRET` is missing or too short,
    /// or if a numeric variable cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env_opt("JWT_SECRET")
            .ok_or_else(|| AppError::configuration("JWT_SECRET must be set"))?;

        let config = Self {
            jwt_secret,
            password_hash_cost: env_parse_or("PASSWORD_HASH_COST", DEFAULT_PASSWORD_HASH_COST)?,
            database: env_opt("DATABASE_URL").map(DatabaseConfig::new),
        };
        config.validate()?;

        Ok(config)
    }

    /// Build a configuration directly, e.g. from CLI arguments.
    pub fn new(jwt_secret: impl Into<String>, password_hash_cost: u32) -> AppResult<Self> {
        let config = Self {
            jwt_secret: jwt_secret.into(),
            password_hash_cost,
            database: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Use a PostgreSQL credential store.
    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.database = Some(database);
        self
    }

    fn validate(&self) -> AppResult<()> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::configuration(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        if self.password_hash_cost == 0 {
            return Err(AppError::configuration(
                "PASSWORD_HASH_COST must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Get JWT secret as bytes.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}
