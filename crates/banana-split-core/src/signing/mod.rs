/*
[INPUT]:  Messages, wallets and signatures
[OUTPUT]: Personal-message signatures and verification verdicts
[POS]:    Signing layer - codec, wallet abstraction and sign flow
[UPDATE]: When signature methods or wallet types change
*/

pub mod codec;
pub mod evm_wallet;
pub mod message_signer;
pub mod wallet;

pub use codec::{addresses_match, recover_signer, sign, verify};
pub use evm_wallet::EvmWalletSigner;
pub use message_signer::MessageSigner;
pub use wallet::{MockWalletSigner, WalletSigner};
