/*
[INPUT]:  Session readiness and identity gate states
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions shared by session and server
[UPDATE]: When gate states change
*/

use serde::{Deserialize, Serialize};

/// Readiness of the session as seen by the identity gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Auth provider has not reported ready yet
    Unknown,
    Unauthenticated,
    /// Logged in, email domain not yet checked
    PendingDomainCheck,
    Valid,
    /// Email domain mismatch; the session has already been cleared
    RejectedBadDomain,
}

impl SessionState {
    /// Whether the app is usable in this state
    pub fn is_usable(self) -> bool {
        matches!(self, SessionState::Valid)
    }

    /// States the gate will not leave without a fresh login
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Valid | SessionState::RejectedBadDomain)
    }
}
