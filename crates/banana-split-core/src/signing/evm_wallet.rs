/*
[INPUT]:  EVM private key (hex string)
[OUTPUT]: Signed messages and wallet address for EVM chains
[POS]:    Signing layer - local key wallet implementation
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::fmt;
use std::str::FromStr;

use alloy_signer::{Signer, SignerSync};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::error::{BananaError, Result};
use crate::signing::WalletSigner;
use crate::signing::codec::encode_signature;

/// Signer backed by a raw secp256k1 private key held in memory
pub struct EvmWalletSigner {
    signer: PrivateKeySigner,
    address: String,
}

impl EvmWalletSigner {
    /// Create a new EVM wallet signer from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str) -> Result<Self> {
        let private_key_hex = private_key_hex.trim();
        let private_key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| BananaError::MalformedKey(e.to_string()))?;

        let address = signer.address().to_checksum(None);

        Ok(Self { signer, address })
    }

    /// Sign without going through the async trait
    ///
    /// Local keys never wait on a user, so link proofs use this directly.
    pub fn sign_message_sync(&self, message: &str) -> Result<String> {
        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| BananaError::MalformedKey(format!("Failed to sign EVM message: {e}")))?;

        Ok(encode_signature(&signature))
    }
}

impl fmt::Debug for EvmWalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmWalletSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletSigner for EvmWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| BananaError::MalformedKey(format!("Failed to sign EVM message: {e}")))?;

        Ok(encode_signature(&signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key
    const PK: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_evm_wallet_signer() {
        let signer = EvmWalletSigner::new(PK).unwrap();

        assert_eq!(signer.address(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

        let message = "hello";
        let signature = signer.sign_message(message).await.unwrap();

        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 132); // 0x + 65 bytes * 2 = 132
    }

    #[tokio::test]
    async fn test_sync_and_async_signatures_agree() {
        let signer = EvmWalletSigner::new(PK).unwrap();
        let async_sig = signer.sign_message("banana").await.unwrap();
        let sync_sig = signer.sign_message_sync("banana").unwrap();
        assert_eq!(async_sig, sync_sig);
    }

    #[test]
    fn test_evm_wallet_signer_no_prefix() {
        let pk = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let signer = EvmWalletSigner::new(pk).unwrap();
        assert_eq!(signer.address(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn test_evm_wallet_signer_rejects_garbage() {
        let err = EvmWalletSigner::new("0xnot-a-key").unwrap_err();
        assert!(matches!(err, BananaError::MalformedKey(_)));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let signer = EvmWalletSigner::new(PK).unwrap();
        let rendered = format!("{signer:?}");
        assert!(rendered.contains("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(!rendered.contains("ac0974bec39a17e36ba4a6b4d238ff944bacb478"));
    }
}
