/*
[INPUT]:  Provider user records and signing results
[OUTPUT]: Session identity and signature value types
[POS]:    Data layer - type definitions shared across modules
[UPDATE]: When identity or signature shapes change
*/

use serde::{Deserialize, Serialize};

/// Identity of the logged-in user, owned by the session store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub user_id: String,
    pub email_address: Option<String>,
    /// Checksummed addresses in provider order
    #[serde(default)]
    pub linked_wallet_addresses: Vec<String>,
    #[serde(skip_serializing)]
    pub raw_session_token: String,
}

impl SessionIdentity {
    pub fn new(user_id: impl Into<String>, raw_session_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email_address: None,
            linked_wallet_addresses: Vec::new(),
            raw_session_token: raw_session_token.into(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    /// Add a linked wallet, ignoring case-insensitive duplicates
    pub fn with_wallet(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        if !self.has_wallet(&address) {
            self.linked_wallet_addresses.push(address);
        }
        self
    }

    /// The wallet used for signing and link proofs
    pub fn primary_wallet(&self) -> Option<&str> {
        self.linked_wallet_addresses.first().map(String::as_str)
    }

    pub fn has_wallet(&self, address: &str) -> bool {
        self.linked_wallet_addresses
            .iter()
            .any(|linked| linked.eq_ignore_ascii_case(address.trim()))
    }
}

/// A plaintext message a user asked to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest {
    pub plaintext_message: String,
}

impl SigningRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            plaintext_message: message.into(),
        }
    }
}

/// Outcome of signing or checking a message against an expected signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResult {
    pub signature_hex: String,
    pub recovered_signer_address: Option<String>,
    pub matches_expected_signer: bool,
}

impl SignatureResult {
    /// Project into the debug view shape, if recovery succeeded
    pub fn info(&self, message: &str) -> Option<SignatureInfo> {
        self.recovered_signer_address
            .as_ref()
            .map(|signer| SignatureInfo::new(signer.clone(), message, &self.signature_hex))
    }
}

/// The message and signature a signer address was recovered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedContent {
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signer_address: String,
    pub content: SignedContent,
}

impl SignatureInfo {
    pub fn new(signer_address: String, message: &str, signature: &str) -> Self {
        Self {
            signer_address,
            content: SignedContent {
                message: message.to_string(),
                signature: signature.to_string(),
            },
        }
    }
}
