/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Banana Split core crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod error;
pub mod http;
pub mod link;
pub mod session;
pub mod signing;
pub mod types;

pub use error::{BananaError, Result};

// Re-export commonly used types from http
pub use http::{AppCredentials, ClientConfig, ProviderClient, VerifyClient};

// Re-export commonly used types from link
pub use link::{
    FileRedirectStore, LinkParams, LinkProof, LinkProofEffect, LoginRedirect, MemoryRedirectStore,
    REDIRECT_PARAMS_KEY, RedirectParamStore, RedirectParams, prove, prove_link, watch_session,
};

// Re-export commonly used types from session
pub use session::{
    AccessTokenClaims, AccessTokenStore, ENTRY_PATH, IdentityGate, REJECTION_NOTICE,
    SessionSnapshot, SessionStore, ViewDecision, guard_protected_view,
};

// Re-export commonly used types from signing
pub use signing::{
    EvmWalletSigner, MessageSigner, MockWalletSigner, WalletSigner, addresses_match,
    recover_signer, verify,
};

// Re-export all types
pub use types::*;
