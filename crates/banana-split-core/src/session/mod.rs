/*
[INPUT]:  Provider login/logout events and access tokens
[OUTPUT]: Session snapshots, gate states and token lifecycle
[POS]:    Session layer - identity ownership and access gating
[UPDATE]: When session ownership or gating rules change
*/

pub mod gate;
pub mod store;
pub mod token;

pub use gate::{
    ALLOWED_EMAIL_SUFFIX, ENTRY_PATH, IdentityGate, REJECTION_NOTICE, ViewDecision,
    email_allowed, guard_protected_view,
};
pub use store::{SessionSnapshot, SessionStore};
pub use token::{AccessTokenClaims, AccessTokenStore, TokenData, decode_unverified_claims};
