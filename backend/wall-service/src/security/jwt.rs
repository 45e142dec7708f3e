//! HS256 access tokens for the wall API.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::security::revocation::RevocationList;

/// JWT claims carried by a wall access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies access tokens, and remembers which tokens were
/// revoked before their natural expiry.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    revoked: RevocationList,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry boundaries are exact, no grace window.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs),
            revoked: RevocationList::new(ttl_secs),
        }
    }

    /// Issue a fresh token for `user_id`, valid for the configured window.
    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))?;
        Ok(token)
    }

    /// Verify signature, expiry and revocation, returning the subject.
    ///
    /// Expired tokens fail with `TokenExpired`; every other failure,
    /// including revocation, is an indistinct `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let data = self.decode(token)?;
        if self.revoked.contains(token) {
            return Err(AppError::InvalidToken);
        }
        Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::InvalidToken)
    }

    /// Revoke a token ahead of its natural expiry. Tokens that no longer
    /// decode are still denylisted, with the entry lifetime falling back
    /// to the full validity window.
    pub fn invalidate(&self, token: &str) {
        let expires_at = self.decode(token).ok().map(|data| data.claims.exp);
        self.revoked.insert(token, expires_at);
    }

    /// How long a freshly issued token stays valid.
    pub fn validity_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    fn decode(&self, token: &str) -> Result<TokenData<Claims>> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let service = TokenService::new(SECRET, 3600);
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).expect("issue should succeed");
        let subject = service.verify(&token).expect("verify should succeed");
        assert_eq!(subject, user_id);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = TokenService::new(SECRET, 3600);
        let verifier = TokenService::new("a-different-secret", 3600);

        let token = issuer.issue(Uuid::new_v4()).expect("issue should succeed");
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = TokenService::new(SECRET, 3600);
        let token = service.issue(Uuid::new_v4()).expect("issue should succeed");

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        let err = service.verify(&tampered).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_expired_not_invalid() {
        // Negative validity puts exp in the past at issue time.
        let service = TokenService::new(SECRET, -10);
        let token = service.issue(Uuid::new_v4()).expect("issue should succeed");

        let err = service.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_invalidate_revokes_until_expiry() {
        let service = TokenService::new(SECRET, 3600);
        let token = service.issue(Uuid::new_v4()).expect("issue should succeed");
        let other = service.issue(Uuid::new_v4()).expect("issue should succeed");

        service.invalidate(&token);

        assert!(matches!(
            service.verify(&token).unwrap_err(),
            AppError::InvalidToken
        ));
        // Unrelated tokens keep verifying.
        service.verify(&other).expect("other token still valid");
    }

    #[test]
    fn test_invalidate_expired_token_is_harmless() {
        let expired_issuer = TokenService::new(SECRET, -10);
        let token = expired_issuer
            .issue(Uuid::new_v4())
            .expect("issue should succeed");

        let service = TokenService::new(SECRET, 3600);
        service.invalidate(&token);
        assert!(service.revoked.contains(&token));
    }
}
