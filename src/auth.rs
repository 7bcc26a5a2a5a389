//! Caller identity
//!
//! Handlers never see credentials, only the resolved user id. Token
//! verification lives behind `Authenticator` so a real verifier can be
//! dropped in without touching the chat code.

use crate::error::AdvisorError;
use crate::Result;
use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Resolves request headers to a user id
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid>;
}

/// Accepts `Authorization: Bearer <token>` and maps the token to a stable id
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerTokenAuthenticator;

impl Authenticator for BearerTokenAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| {
                AdvisorError::Unauthorized("Authorization denied, no token provided".to_string())
            })?
            .to_str()
            .map_err(|_| AdvisorError::Unauthorized("Malformed authorization header".to_string()))?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AdvisorError::Unauthorized("Expected a bearer token".to_string())
            })?;

        Ok(user_id_from_token(token))
    }
}

/// A UUID token is taken as-is; anything else hashes to a stable id
pub fn user_id_from_token(token: &str) -> Uuid {
    Uuid::parse_str(token).unwrap_or_else(|_| stable_uuid_from_string(token))
}

fn stable_uuid_from_string(input: &str) -> Uuid {
    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}
