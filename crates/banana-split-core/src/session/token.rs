/*
[INPUT]:  Provider-issued access tokens (JWT)
[OUTPUT]: Token claims, retrieval and expiration status
[POS]:    Session layer - access token lifecycle
[UPDATE]: When claim layout or token storage strategy changes
*/

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BananaError, Result};

/// Claims carried by a provider access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Session id
    #[serde(default)]
    pub sid: String,
    /// Provider user id
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at()
    }
}

/// Read the claims of a token without checking its signature
///
/// For display and logging only. Use the provider client to verify.
pub fn decode_unverified_claims(token: &str) -> Result<AccessTokenClaims> {
    let token = token.trim();
    let payload_b64 = token
        .split('.')
        .nth(1)
        .ok_or_else(|| BananaError::InvalidResponse("access token is not a valid JWT".to_string()))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| URL_SAFE.decode(payload_b64))
        .map_err(|e| {
            BananaError::InvalidResponse(format!("Invalid access token payload base64: {e}"))
        })?;

    Ok(serde_json::from_slice(&payload_bytes)?)
}

/// Stored token data with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
}

/// Thread-safe holder of the current access token
#[derive(Debug, Clone)]
pub struct AccessTokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl AccessTokenStore {
    /// Create a new empty token store
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(None)),
        }
    }

    /// Store a token, taking expiry and user from its claims
    pub fn set_token(&self, token: String) -> Result<()> {
        let claims = decode_unverified_claims(&token)?;
        let token_data = TokenData {
            token,
            expires_at: claims.expires_at(),
            user_id: claims.sub,
        };

        *self.write() = Some(token_data);
        Ok(())
    }

    /// Get the current token if available and not expired
    pub fn get_token(&self) -> Option<String> {
        self.read()
            .as_ref()
            .filter(|data| Utc::now() <= data.expires_at)
            .map(|data| data.token.clone())
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        match self.read().as_ref() {
            Some(data) => Utc::now() > data.expires_at,
            None => true,
        }
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        self.read().clone()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        *self.write() = None;
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<TokenData>> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<TokenData>> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for AccessTokenStore {
    fn default() -> Self {
        Self::new()
    }
}
