/*
[INPUT]:  Shared-link query params and the session wallet
[OUTPUT]: Validated link params, stored redirects, link proofs
[POS]:    Link layer - deep links and key-to-wallet proofs
[UPDATE]: When link params, storage or proof rules change
*/

pub mod params;
pub mod proof;
pub mod redirect;

pub use params::{LinkParams, is_valid_private_key};
pub use proof::{LinkProof, LinkProofEffect, prove, prove_link, watch_session};
pub use redirect::{
    FileRedirectStore, LoginRedirect, MemoryRedirectStore, REDIRECT_PARAMS_KEY, RedirectParamStore,
    RedirectParams,
};
