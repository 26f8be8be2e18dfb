/*
[INPUT]:  Provider readiness, login and logout events
[OUTPUT]: Session snapshots and change notifications
[POS]:    Session layer - single owner of the session identity
[UPDATE]: When session fields or notification semantics change
*/

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::types::SessionIdentity;

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Provider has finished initialising
    pub ready: bool,
    pub identity: Option<SessionIdentity>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.ready && self.identity.is_some()
    }

    pub fn primary_wallet(&self) -> Option<&str> {
        self.identity.as_ref().and_then(SessionIdentity::primary_wallet)
    }

    pub fn email(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|identity| identity.email_address.as_deref())
    }
}

/// Thread-safe session holder
///
/// Every mutation goes through this type; readers take snapshots or
/// subscribe for changes. Clones share the same session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionStore {
    /// Create a store that has not seen the provider become ready
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Record that the provider finished initialising
    pub fn mark_ready(&self) {
        self.tx.send_if_modified(|snapshot| {
            let changed = !snapshot.ready;
            snapshot.ready = true;
            changed
        });
    }

    /// Replace the session with a freshly logged-in identity
    pub fn login(&self, identity: SessionIdentity) {
        info!(
            user_id = %identity.user_id,
            wallets = identity.linked_wallet_addresses.len(),
            "session established"
        );
        self.tx.send_modify(|snapshot| {
            snapshot.ready = true;
            snapshot.identity = Some(identity);
        });
    }

    /// Destroy the session, returning the identity that was dropped
    pub fn logout(&self) -> Option<SessionIdentity> {
        let mut dropped = None;
        self.tx.send_if_modified(|snapshot| {
            dropped = snapshot.identity.take();
            dropped.is_some()
        });
        if let Some(identity) = &dropped {
            info!(user_id = %identity.user_id, "session cleared");
        }
        dropped
    }

    /// Destroy the session only if its identity still satisfies `predicate`
    ///
    /// Check and removal happen under one lock, so an identity that logged
    /// in after the caller looked is left alone.
    pub fn logout_if<F>(&self, predicate: F) -> Option<SessionIdentity>
    where
        F: FnOnce(&SessionIdentity) -> bool,
    {
        let mut dropped = None;
        self.tx.send_if_modified(|snapshot| {
            if snapshot.identity.as_ref().is_some_and(predicate) {
                dropped = snapshot.identity.take();
            }
            dropped.is_some()
        });
        if let Some(identity) = &dropped {
            info!(user_id = %identity.user_id, "session cleared");
        }
        dropped
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        self.tx.borrow().identity.clone()
    }

    /// Receive a notification on every session change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
