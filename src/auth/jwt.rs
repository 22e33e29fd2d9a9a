use std::path::Path;

use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};

use crate::auth::claims::Claims;
use crate::config::MAX_TOKEN_EXPIRY_HOURS;

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    Malformed,
    #[error("invalid token")]
    Invalid,
    #[error("error while signing token: {0}")]
    Signing(String),
    #[error("invalid key material: {0}")]
    Key(String),
}

/// RS256 signer/verifier. Immutable after construction.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
    validation: Validation,
}

impl TokenService {
    pub fn from_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        ttl_hours: i64,
    ) -> Result<Self, TokenError> {
        if !(1..=MAX_TOKEN_EXPIRY_HOURS).contains(&ttl_hours) {
            return Err(TokenError::Key(format!(
                "token expiry {ttl_hours}h outside 1..={MAX_TOKEN_EXPIRY_HOURS}h"
            )));
        }
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::Key(format!("failed parse private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::Key(format!("failed parse public key: {e}")))?;
        Ok(Self {
            encoding,
            decoding,
            ttl: TimeDuration::hours(ttl_hours),
            validation: Validation::new(Algorithm::RS256),
        })
    }

    pub fn from_files(
        private_key: impl AsRef<Path>,
        public_key: impl AsRef<Path>,
        ttl_hours: i64,
    ) -> anyhow::Result<Self> {
        let private_key = private_key.as_ref();
        let public_key = public_key.as_ref();
        let private_pem = std::fs::read(private_key)
            .with_context(|| format!("read private key file {}", private_key.display()))?;
        let public_pem = std::fs::read(public_key)
            .with_context(|| format!("read public key file {}", public_key.display()))?;
        Ok(Self::from_pem(&private_pem, &public_pem, ttl_hours)?)
    }

    /// Returns `"Bearer <jwt>"`.
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".into()))?;
        let claims = Claims {
            id: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        self.sign(&claims).map(|token| format!("{BEARER_PREFIX}{token}"))
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let token = encode(&Header::new(Algorithm::RS256), claims, &self.encoding).map_err(|e| {
            error!(error = %e, "jwt signing failed");
            TokenError::Signing(e.to_string())
        })?;
        debug!(user_id = claims.id, "jwt signed");
        Ok(token)
    }

    /// Takes the raw token, without the scheme label. Every failure other
    /// than empty input collapses to [`TokenError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Malformed);
        }
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(reason = ?e.kind(), "jwt rejected");
            TokenError::Invalid
        })?;
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims.id)
    }
}
