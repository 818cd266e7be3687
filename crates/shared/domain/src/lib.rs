//! Domain layer - Core entities and value objects for authentication.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the stored credential, the password value object and the hasher that
//! produces it.

pub mod constants;
pub mod credential;
pub mod error;
pub mod password;

pub use constants::*;
pub use credential::{Credential, CredentialResponse};
pub use error::{DomainError, DomainResult};
pub use password::{Password, PasswordHasher};
