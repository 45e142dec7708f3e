//! Process-local denylist of revoked tokens.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use sha2::{Digest, Sha256};

// Keep already-expired tokens listed for a short window so a revocation
// still wins against clock skew between issuer and verifier.
const EXPIRED_ENTRY_TTL_SECS: i64 = 300;

/// Revoked-token list keyed by SHA-256 digest, so raw tokens never sit in
/// memory. Each entry carries its own eviction deadline: a revocation does
/// not need to outlive the token it revokes.
pub struct RevocationList {
    max_ttl_secs: i64,
    entries: RwLock<HashMap<String, i64>>,
}

impl RevocationList {
    /// `max_ttl_secs` is the longest a token can stay valid, which caps
    /// how long any denylist entry is kept.
    pub fn new(max_ttl_secs: i64) -> Self {
        Self {
            max_ttl_secs: max_ttl_secs.max(EXPIRED_ENTRY_TTL_SECS),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Add a token to the denylist. `expires_at_secs` is the token's own
    /// exp claim when known; entries for already-expired tokens are kept
    /// for a short fixed window.
    pub fn insert(&self, token: &str, expires_at_secs: Option<i64>) {
        let now = chrono::Utc::now().timestamp();
        let ttl = match expires_at_secs {
            Some(exp) => {
                let remaining = exp - now;
                if remaining > self.max_ttl_secs {
                    self.max_ttl_secs
                } else if remaining > 0 {
                    remaining
                } else {
                    EXPIRED_ENTRY_TTL_SECS
                }
            }
            None => self.max_ttl_secs,
        };

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Piggyback eviction of dead entries on writes; reads stay cheap.
        entries.retain(|_, deadline| *deadline > now);
        entries.insert(sha256_hash(token), now + ttl);

        tracing::info!(
            "Token revoked, denylist entry will expire in {} seconds",
            ttl
        );
    }

    /// Whether the token is currently denied.
    pub fn contains(&self, token: &str) -> bool {
        let digest = sha256_hash(token);
        let now = chrono::Utc::now().timestamp();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        matches!(entries.get(&digest), Some(deadline) if *deadline > now)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash a token using SHA-256
fn sha256_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hash_consistency() {
        let token = "test_token_12345";
        let hash1 = sha256_hash(token);
        let hash2 = sha256_hash(token);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_insert_then_contains() {
        let list = RevocationList::new(3600);
        let exp = chrono::Utc::now().timestamp() + 1800;
        list.insert("some.jwt.token", Some(exp));
        assert!(list.contains("some.jwt.token"));
        assert!(!list.contains("another.jwt.token"));
    }

    #[test]
    fn test_expired_token_still_listed_briefly() {
        let list = RevocationList::new(3600);
        let past = chrono::Utc::now().timestamp() - 100;
        list.insert("stale.jwt.token", Some(past));
        // The entry gets the fixed short window, not a negative ttl.
        assert!(list.contains("stale.jwt.token"));
    }

    #[test]
    fn test_dead_entries_are_evicted_on_write() {
        let list = RevocationList::new(3600);
        let now = chrono::Utc::now().timestamp();
        list.entries
            .write()
            .expect("lock")
            .insert(sha256_hash("old.jwt.token"), now - 1);

        assert!(!list.contains("old.jwt.token"));

        list.insert("fresh.jwt.token", Some(now + 600));
        assert_eq!(list.len(), 1);
    }
}
