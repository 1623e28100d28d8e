// src/auth/jwt.rs
use crate::error::{ClientError, ClientResult};
use crate::models::auth::Claims;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

/// Read the display claims of a bearer token without checking its signature.
///
/// The client never holds the signing secret; the backend verifies every
/// request. Expiry is returned, not enforced, so the caller decides what
/// "expired" means at load time.
pub fn decode_unverified(token: &str) -> ClientResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| ClientError::Token(e.to_string()))
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expiry) => expiry <= now,
            None => true,
        }
    }
}
