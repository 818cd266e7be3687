//! Credential persistence.

pub mod entities;
mod credential_store;
mod memory_store;

#[cfg(any(test, feature = "test-utils"))]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, PgCredentialStore};
pub use memory_store::MemoryCredentialStore;
