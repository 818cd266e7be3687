//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 1;

// =============================================================================
// Password Hashing
// =============================================================================

/// Default Argon2 iteration count (time cost)
pub const DEFAULT_PASSWORD_HASH_COST: u32 = 2;

/// Argon2 memory cost in KiB (fixed, OWASP minimum for Argon2id)
pub const PASSWORD_HASH_MEMORY_KIB: u32 = 19 * 1024;

/// Argon2 lanes
pub const PASSWORD_HASH_PARALLELISM: u32 = 1;

// =============================================================================
// Authentication
// =============================================================================

/// Token lifetime in hours, counted from issuance
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";
