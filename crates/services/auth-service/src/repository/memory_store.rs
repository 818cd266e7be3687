//! In-process credential store for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CredentialStore;
use common::{AppError, AppResult};
use domain::Credential;

/// Credential map keyed by email.
///
/// Lookup and insert happen under one write lock, so concurrent signups for
/// the same email produce exactly one credential.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials
    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        Ok(self.credentials.read().await.get(email).cloned())
    }

    async fn create_and_save(&self, email: String, password_hash: String) -> AppResult<Credential> {
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&email) {
            return Err(AppError::EmailInUse);
        }

        let credential = Credential::new(email.clone(), password_hash);
        credentials.insert(email, credential.clone());
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_find() {
        let store = MemoryCredentialStore::new();
        let created = store
            .create_and_save("a@x.com".into(), "hash".into())
            .await
            .unwrap();

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_find_is_exact_match() {
        let store = MemoryCredentialStore::new();
        store
            .create_and_save("a@x.com".into(), "hash".into())
            .await
            .unwrap();

        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryCredentialStore::new();
        store
            .create_and_save("a@x.com".into(), "h1".into())
            .await
            .unwrap();

        let result = store.create_and_save("a@x.com".into(), "h2".into()).await;
        assert!(matches!(result, Err(AppError::EmailInUse)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_ping() {
        assert!(MemoryCredentialStore::new().ping().await.is_ok());
    }
}
