/*
[INPUT]:  Auth provider response schema
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for provider communication
[UPDATE]: When provider schema changes or new account kinds matter
*/

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::models::SessionIdentity;
use crate::signing::codec::checksum_address;

/// App settings returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub id: String,
    pub verification_key: String,
}

/// User record returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub linked_accounts: Vec<LinkedAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkedAccount {
    Email {
        address: String,
    },
    Wallet {
        address: String,
        #[serde(default)]
        chain_type: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl ProviderUser {
    /// Build the session identity for this user and the token it logged in with
    ///
    /// Wallet addresses are stored checksummed; malformed ones are dropped.
    pub fn into_identity(self, raw_session_token: impl Into<String>) -> SessionIdentity {
        let mut identity = SessionIdentity::new(self.id, raw_session_token);
        for account in self.linked_accounts {
            identity = match account {
                LinkedAccount::Email { address } if identity.email_address.is_none() => {
                    identity.with_email(address)
                }
                LinkedAccount::Wallet { address, chain_type }
                    if chain_type.as_deref().is_none_or(|chain| chain == "ethereum") =>
                {
                    match checksum_address(&address) {
                        Ok(checksummed) => identity.with_wallet(checksummed),
                        Err(err) => {
                            warn!(
                                user_id = %identity.user_id,
                                error = %err,
                                "dropping malformed wallet"
                            );
                            identity
                        }
                    }
                }
                _ => identity,
            };
        }
        identity
    }
}
