//! Bearer token decoding
//!
//! This module reads the claims out of the backend's JWT without checking the
//! signature. The client cannot verify the HMAC (the secret stays on the
//! server); the backend rejects forged or stale tokens with a 401, which the
//! API client turns into a logout.
//!
//! Decoding fails when:
//! - the token is not three dot-separated segments
//! - the payload segment is not base64url
//! - the payload is not a JSON object of claims
//! - the `exp` claim is in the past (when expiry checking is enabled)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::config::SessionConfig;
use crate::models::{Identity, TokenClaims, UserRole};

/// Reasons a token cannot be turned into claims
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not a three-segment JWT
    #[error("Malformed token: {0}")]
    Malformed(&'static str),

    /// Payload segment is not base64url
    #[error("Token payload is not valid base64: {0}")]
    Base64(String),

    /// Payload is not a JSON claims object
    #[error("Token payload is not valid JSON: {0}")]
    Json(String),

    /// `exp` is in the past
    #[error("Token expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Claims decoded fine but lack a field an identity needs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Token claims do not carry a usable '{0}'")]
pub struct IncompleteClaims(pub &'static str);

/// Decode the payload segment of a JWT into claims.
///
/// No signature or expiry check happens here; see [`TokenDecoder`] for the
/// expiry-aware variant.
///
/// # Arguments
///
/// * `token` - The raw bearer token
///
/// # Errors
///
/// Returns a [`DecodeError`] if the token is not a JWT or its payload does not
/// parse.
///
/// # Example
///
/// ```ignore
/// use share2go::services::token::decode_claims;
///
/// let claims = decode_claims(&token)?;
/// println!("{:?}", claims.sub);
/// ```
pub fn decode_claims(token: &str) -> Result<TokenClaims, DecodeError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::Malformed("expected three dot-separated segments"));
    };

    if payload.is_empty() {
        return Err(DecodeError::Malformed("empty payload segment"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(e.to_string()))
}

/// Build an identity purely from token claims.
///
/// `id` comes from `uid`, `email` from `sub`, `role` from `role`; `name` is
/// carried over when present.
pub fn identity_from_claims(claims: &TokenClaims) -> Result<Identity, IncompleteClaims> {
    let id = claims
        .uid
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or(IncompleteClaims("uid"))?;
    let email = claims
        .sub
        .clone()
        .filter(|s| !s.trim().is_empty())
        .ok_or(IncompleteClaims("sub"))?;
    let role = claims
        .role
        .as_deref()
        .and_then(|r| r.parse::<UserRole>().ok())
        .ok_or(IncompleteClaims("role"))?;

    Ok(Identity {
        id,
        email,
        name: claims.name.clone().filter(|n| !n.trim().is_empty()),
        role,
    })
}

/// Claims decoder that also enforces `exp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDecoder {
    check_expiry: bool,
    leeway_seconds: i64,
}

impl Default for TokenDecoder {
    fn default() -> Self {
        Self {
            check_expiry: true,
            leeway_seconds: 0,
        }
    }
}

impl From<&SessionConfig> for TokenDecoder {
    fn from(config: &SessionConfig) -> Self {
        Self {
            check_expiry: config.check_expiry,
            leeway_seconds: config.leeway_seconds.max(0),
        }
    }
}

impl TokenDecoder {
    /// Decoder that never rejects on `exp`
    pub fn without_expiry() -> Self {
        Self {
            check_expiry: false,
            leeway_seconds: 0,
        }
    }

    /// Decode claims, rejecting tokens that expired before now
    pub fn decode(&self, token: &str) -> Result<TokenClaims, DecodeError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode claims, rejecting tokens that expired before `now`
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, DecodeError> {
        let claims = decode_claims(token)?;
        if self.check_expiry && claims.is_expired_at(now, self.leeway_seconds) {
            let expired_at = claims.expires_at().unwrap_or(now);
            return Err(DecodeError::Expired(expired_at));
        }
        Ok(claims)
    }
}

/// Build an unsigned token around the given claims.
#[cfg(test)]
pub(crate) fn make_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}
