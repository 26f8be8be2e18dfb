/*
[INPUT]:  Plaintext messages, hex signatures, expected signer addresses
[OUTPUT]: Signatures, recovered signer addresses, verification verdicts
[POS]:    Signing layer - personal-message signature codec
[UPDATE]: When signature encoding or recovery scheme changes
*/

use std::str::FromStr;

use alloy_primitives::{Address, Signature};

use crate::error::{BananaError, Result};
use crate::signing::WalletSigner;

/// Length of an r || s || v signature in bytes
pub const SIGNATURE_LENGTH: usize = 65;

/// Sign a message with the connected wallet, if there is one
pub async fn sign(message: &str, signer: Option<&dyn WalletSigner>) -> Result<String> {
    let signer = signer.ok_or(BananaError::SigningUnavailable)?;
    signer.sign_message(message).await
}

/// Recover the checksummed address that produced `signature_hex` over `message`
///
/// Uses the EIP-191 personal-message prefix, same as `sign`.
pub fn recover_signer(message: &str, signature_hex: &str) -> Result<String> {
    let signature = parse_signature(signature_hex)?;
    let address = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| BananaError::MalformedSignature(e.to_string()))?;
    Ok(address.to_checksum(None))
}

/// Check that `signature_hex` over `message` came from `expected_address`
///
/// Never fails: anything unrecoverable is simply not a match.
pub fn verify(message: &str, signature_hex: &str, expected_address: &str) -> bool {
    match recover_signer(message, signature_hex) {
        Ok(recovered) => addresses_match(&recovered, expected_address),
        Err(err) => {
            tracing::debug!(error = %err, "signature did not recover");
            false
        }
    }
}

/// Decode a 0x-prefixed (or bare) hex signature of 65 bytes
pub fn parse_signature(signature_hex: &str) -> Result<Signature> {
    let trimmed = signature_hex.trim();
    let raw = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let bytes = hex::decode(raw)
        .map_err(|e| BananaError::MalformedSignature(format!("invalid hex: {e}")))?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(BananaError::MalformedSignature(format!(
            "expected {SIGNATURE_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }

    Signature::try_from(bytes.as_slice()).map_err(|e| BananaError::MalformedSignature(e.to_string()))
}

/// Encode a signature as 0x-prefixed hex of r || s || v
pub fn encode_signature(signature: &Signature) -> String {
    format!("0x{}", hex::encode(signature.as_bytes()))
}

/// Parse an address and return its checksummed form
pub fn checksum_address(address: &str) -> Result<String> {
    Address::from_str(address.trim())
        .map(|parsed| parsed.to_checksum(None))
        .map_err(|e| BananaError::MalformedAddress(format!("{address}: {e}")))
}

/// Case-insensitive address comparison, tolerant of a missing 0x prefix
pub fn addresses_match(left: &str, right: &str) -> bool {
    normalize_evm_address(left) == normalize_evm_address(right)
}

fn normalize_evm_address(address: &str) -> String {
    let address = address.trim();
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address)
        .to_ascii_lowercase()
}
