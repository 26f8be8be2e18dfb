/*
[INPUT]:  Message to sign and a connected wallet
[OUTPUT]: Personal-message signature string
[POS]:    Signing layer - wallet integration abstraction
[UPDATE]: When adding new wallet types or changing signature format
*/

use async_trait::async_trait;

use crate::error::{BananaError, Result};

/// Trait for wallet signing operations
///
/// Implemented by local key signers and by anything fronting an external
/// wallet. The trait is async because an external wallet may wait on the
/// user to confirm, with no upper bound.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Get the wallet address (EIP-55 checksummed)
    fn address(&self) -> &str;

    /// Sign a message with the personal-message scheme
    ///
    /// Returns a 0x-prefixed hex signature of 65 bytes (r, s, v).
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// Mock wallet signer for testing
#[derive(Debug, Clone)]
pub struct MockWalletSigner {
    address: String,
    signature: Option<String>,
}

impl MockWalletSigner {
    /// Create a new mock signer with predetermined signature
    pub fn new(address: &str, signature: &str) -> Self {
        Self {
            address: address.to_string(),
            signature: Some(signature.to_string()),
        }
    }

    /// Create a mock signer whose user declines every request
    pub fn rejecting(address: &str) -> Self {
        Self {
            address: address.to_string(),
            signature: None,
        }
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, _message: &str) -> Result<String> {
        self.signature
            .clone()
            .ok_or_else(|| BananaError::UserRejected("user declined the request".to_string()))
    }
}
