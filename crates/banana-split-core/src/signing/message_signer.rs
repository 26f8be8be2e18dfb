/*
[INPUT]:  Signing requests and the session's connected wallet
[OUTPUT]: Signature results checked against the wallet address
[POS]:    Signing layer - sign-and-verify flow for the debug view
[UPDATE]: When the sign flow or re-entrancy policy changes
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::{BananaError, Result};
use crate::signing::{WalletSigner, codec};
use crate::types::{SignatureResult, SigningRequest};

/// Signs user messages with the connected wallet and checks the result
///
/// At most one request is outstanding per signer. A second call made while
/// the first is still waiting on the wallet fails with `SigningInFlight`.
pub struct MessageSigner {
    wallet: Option<Arc<dyn WalletSigner>>,
    in_flight: AtomicBool,
}

impl MessageSigner {
    pub fn new(wallet: Option<Arc<dyn WalletSigner>>) -> Self {
        Self {
            wallet,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Address of the connected wallet
    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet.as_deref().map(|wallet| wallet.address())
    }

    pub fn is_signing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Sign the request and verify the signature against the wallet address
    pub async fn sign(&self, request: &SigningRequest) -> Result<SignatureResult> {
        let wallet = self.wallet.as_deref().ok_or(BananaError::SigningUnavailable)?;
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let signature_hex = codec::sign(&request.plaintext_message, Some(wallet)).await?;

        let recovered_signer_address =
            match codec::recover_signer(&request.plaintext_message, &signature_hex) {
                Ok(address) => Some(address),
                Err(err) => {
                    warn!(error = %err, "wallet returned an unrecoverable signature");
                    None
                }
            };
        let matches_expected_signer = recovered_signer_address
            .as_deref()
            .is_some_and(|recovered| codec::addresses_match(recovered, wallet.address()));

        info!(
            wallet = %wallet.address(),
            valid = matches_expected_signer,
            "message signed"
        );

        Ok(SignatureResult {
            signature_hex,
            recovered_signer_address,
            matches_expected_signer,
        })
    }
}

/// Holds the in-flight flag for the lifetime of one request
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BananaError::SigningInFlight)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
