//! In-process registry of tokens revoked before their natural expiry.
//!
//! Entries are keyed by the raw token string and remember the token's own
//! expiry so that [`RevocationRegistry::purge_expired`] can drop them once
//! the token would be rejected anyway.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::token::peek_expiry;
use domain::{SECONDS_PER_HOUR, TOKEN_LIFETIME_HOURS};

/// Set of revoked token strings.
///
/// Constructed once by the composition root and shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct RevocationRegistry {
    entries: RwLock<HashMap<String, i64>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token`. Adding a token twice is a no-op.
    pub fn add(&self, token: &str) {
        let expires_at = peek_expiry(token)
            .unwrap_or_else(|| Utc::now().timestamp() + TOKEN_LIFETIME_HOURS * SECONDS_PER_HOUR);

        self.write().entry(token.to_string()).or_insert(expires_at);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.read().contains_key(token)
    }

    /// Forget `token`. Removing an absent token is a no-op.
    pub fn remove(&self, token: &str) {
        self.write().remove(token);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Evict entries whose token has expired. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now().timestamp())
    }

    /// Evict entries with an expiry at or before `now` (unix seconds).
    pub fn purge_expired_at(&self, now: i64) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        before - entries.len()
    }

    // A panic while holding the lock cannot leave the map half-updated,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, i64>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, i64>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Claims, TokenIssuer};
    use std::sync::Arc;
    use uuid::Uuid;

    fn token_expiring_at(exp: i64) -> String {
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: exp - 10,
            exp,
            jti: Uuid::new_v4(),
        };
        TokenIssuer::new(b"0123456789abcdef0123456789abcdef")
            .sign(&claims)
            .unwrap()
    }

    #[test]
    fn test_add_and_contains() {
        let registry = RevocationRegistry::new();
        assert!(!registry.contains("t1"));

        registry.add("t1");
        assert!(registry.contains("t1"));
        assert!(!registry.contains("t2"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = RevocationRegistry::new();
        registry.add("t1");
        registry.add("t1");

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = RevocationRegistry::new();
        registry.add("t1");
        registry.remove("t1");
        registry.remove("t1");
        registry.remove("never-added");

        assert!(!registry.contains("t1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = RevocationRegistry::new();
        registry.add("a");
        registry.add("b");
        registry.clear();

        assert!(registry.is_empty());
    }

    #[test]
    fn test_purge_uses_embedded_expiry() {
        let registry = RevocationRegistry::new();
        let now = 1_900_000_000;
        let stale = token_expiring_at(now - 1);
        let live = token_expiring_at(now + 60);

        registry.add(&stale);
        registry.add(&live);

        assert_eq!(registry.purge_expired_at(now), 1);
        assert!(!registry.contains(&stale));
        assert!(registry.contains(&live));
    }

    #[test]
    fn test_undecodable_token_kept_for_one_lifetime() {
        let registry = RevocationRegistry::new();
        let now = Utc::now().timestamp();
        registry.add("opaque-garbage");

        assert_eq!(registry.purge_expired_at(now + 60), 0);
        assert!(registry.contains("opaque-garbage"));

        assert_eq!(registry.purge_expired_at(now + 25 * 3600), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_adds() {
        let registry = Arc::new(RevocationRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        registry.add(&format!("token-{}-{}", i, j));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 400);
    }
}
