/*
[INPUT]:  A raw private key from a shared link, the session wallet address
[OUTPUT]: Link proofs (signature over the wallet address plus recovered signer)
[POS]:    Link layer - proves control of a link-supplied key
[UPDATE]: When the proof message or validity rule changes
*/

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Result;
use crate::link::LinkParams;
use crate::session::SessionSnapshot;
use crate::signing::{EvmWalletSigner, WalletSigner, addresses_match, recover_signer};
use crate::types::SignatureInfo;

/// Signature by the link key over the session wallet address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkProof {
    pub signature_hex: String,
    pub is_valid: bool,
    pub signer_info: Option<SignatureInfo>,
}

impl LinkProof {
    fn failed() -> Self {
        Self {
            signature_hex: String::new(),
            is_valid: false,
            signer_info: None,
        }
    }
}

/// Sign `wallet_address` with the throwaway key and check the result
///
/// The key never leaves this function and nothing touches the network.
pub fn prove_link(raw_private_key_hex: &str, wallet_address: &str) -> Result<LinkProof> {
    let throwaway = EvmWalletSigner::new(raw_private_key_hex)?;
    let signature_hex = throwaway.sign_message_sync(wallet_address)?;
    let recovered = recover_signer(wallet_address, &signature_hex)?;

    let is_valid = addresses_match(&recovered, throwaway.address());
    if !is_valid {
        warn!(
            expected = %throwaway.address(),
            recovered = %recovered,
            "link proof recovered a different signer"
        );
    }

    Ok(LinkProof {
        signer_info: Some(SignatureInfo::new(recovered, wallet_address, &signature_hex)),
        signature_hex,
        is_valid,
    })
}

/// Run the proof for link params, if their key is well formed
///
/// Returns `None` without attempting anything when the key is missing or
/// fails format validation. Signing failures come back as an invalid proof.
pub fn prove(params: &LinkParams, wallet_address: &str) -> Option<LinkProof> {
    let key = params.valid_key()?;
    match prove_link(key, wallet_address) {
        Ok(proof) => Some(proof),
        Err(err) => {
            warn!(error = %err, "link proof signing failed");
            Some(LinkProof::failed())
        }
    }
}

/// Re-runs the link proof when its inputs change
#[derive(Debug, Default)]
pub struct LinkProofEffect {
    inputs: Option<(String, String)>,
    outcome: Option<LinkProof>,
}

impl LinkProofEffect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest params and wallet; recomputes only on change
    ///
    /// Missing inputs leave the previous outcome in place.
    pub fn update(
        &mut self,
        params: Option<&LinkParams>,
        wallet_address: Option<&str>,
    ) -> Option<&LinkProof> {
        let (Some(params), Some(wallet)) = (params, wallet_address) else {
            return self.outcome.as_ref();
        };
        let Some(key) = params.valid_key() else {
            return self.outcome.as_ref();
        };

        let unchanged = self
            .inputs
            .as_ref()
            .is_some_and(|(last_key, last_wallet)| last_key == key && last_wallet == wallet);
        if !unchanged {
            debug!(wallet = %wallet, "computing link proof");
            self.inputs = Some((key.to_string(), wallet.to_string()));
            self.outcome = prove(params, wallet);
        }
        self.outcome.as_ref()
    }

    pub fn outcome(&self) -> Option<&LinkProof> {
        self.outcome.as_ref()
    }
}

/// Drive a `LinkProofEffect` from session changes
///
/// Publishes the outcome after every session update, so the proof appears
/// as soon as the session wallet resolves. Ends when the session sender or
/// every outcome receiver goes away.
pub async fn watch_session(
    params: LinkParams,
    mut session: watch::Receiver<SessionSnapshot>,
    outcome: watch::Sender<Option<LinkProof>>,
) {
    let mut effect = LinkProofEffect::new();
    loop {
        let wallet = session.borrow_and_update().primary_wallet().map(str::to_string);
        let proof = effect.update(Some(&params), wallet.as_deref()).cloned();
        outcome.send_if_modified(|current| {
            let changed = *current != proof;
            *current = proof;
            changed
        });

        tokio::select! {
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = outcome.closed() => break,
        }
    }
}
