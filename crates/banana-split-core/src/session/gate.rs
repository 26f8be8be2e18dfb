/*
[INPUT]:  Session snapshots, request query strings, redirect storage
[OUTPUT]: Gate states, forced logouts, protected-view decisions
[POS]:    Session layer - email-domain gate and protected-view guard
[UPDATE]: When the allow-listed domain or guard rules change
*/

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{BananaError, Result};
use crate::link::{LinkParams, LoginRedirect, RedirectParamStore};
use crate::link::redirect::DASHBOARD_PATH;
use crate::session::{SessionSnapshot, SessionStore};
use crate::types::{SessionIdentity, SessionState};

/// Only emails ending with this suffix may use the app
pub const ALLOWED_EMAIL_SUFFIX: &str = "@status.im";

/// Shown after a rejected login
pub const REJECTION_NOTICE: &str = "Please use an @status.im email address to login.";

/// Where unauthenticated visitors to a protected view are sent
pub const ENTRY_PATH: &str = "/";

/// Enforces the email-domain rule on the shared session
///
/// A rejected session is logged out immediately. The rejection stays
/// visible as `RejectedBadDomain` until the notice is dismissed or a new
/// session logs in.
#[derive(Debug)]
pub struct IdentityGate {
    store: SessionStore,
    rejected_email: Mutex<Option<String>>,
    state: watch::Sender<SessionState>,
}

impl IdentityGate {
    pub fn new(store: SessionStore) -> Self {
        let (state, _rx) = watch::channel(SessionState::Unknown);
        Self {
            store,
            rejected_email: Mutex::new(None),
            state,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Last state produced by `evaluate`
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Notice to display, if a login was just rejected
    pub fn rejection_notice(&self) -> Option<&'static str> {
        self.rejected_email().map(|_| REJECTION_NOTICE)
    }

    /// Close the rejection notice; the user may try again
    pub fn dismiss_notice(&self) {
        *self.lock_rejected() = None;
        self.publish(classify(&self.store.snapshot()));
    }

    /// Run the gate against the current session
    pub fn evaluate(&self) -> SessionState {
        let state = loop {
            let snapshot = self.store.snapshot();
            match classify(&snapshot) {
                SessionState::PendingDomainCheck => {
                    if let Some(state) = self.check_domain(&snapshot) {
                        break state;
                    }
                    debug!("session replaced during domain check, re-checking");
                }
                SessionState::Unauthenticated if self.rejected_email().is_some() => {
                    break SessionState::RejectedBadDomain;
                }
                other => break other,
            }
        };
        self.publish(state);
        state
    }

    /// Evaluate and return the identity only if the app is usable
    pub fn enforce(&self) -> Result<SessionIdentity> {
        match self.evaluate() {
            SessionState::Valid => self
                .store
                .identity()
                .ok_or_else(|| BananaError::Unauthorized("session ended during check".into())),
            SessionState::RejectedBadDomain => Err(BananaError::DomainRejected {
                email: self.rejected_email().unwrap_or_default(),
            }),
            SessionState::Unknown => {
                Err(BananaError::Unauthorized("auth provider not ready".into()))
            }
            SessionState::Unauthenticated | SessionState::PendingDomainCheck => {
                Err(BananaError::Unauthorized("no active session".into()))
            }
        }
    }

    /// Re-evaluate every time the session changes
    ///
    /// Runs until the task is aborted.
    pub async fn run(&self) {
        let mut rx = self.store.subscribe();
        loop {
            self.evaluate();
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// `None` when the checked identity is no longer the current one
    fn check_domain(&self, snapshot: &SessionSnapshot) -> Option<SessionState> {
        let checked = snapshot.identity.as_ref()?;
        match checked.email_address.as_deref() {
            Some(email) if !email_allowed(email) => {
                let dropped = self.store.logout_if(|current| {
                    current.user_id == checked.user_id
                        && current.raw_session_token == checked.raw_session_token
                })?;
                warn!(
                    email = %email,
                    user_id = %dropped.user_id,
                    "email domain rejected, logged out"
                );
                *self.lock_rejected() = Some(email.to_string());
                Some(SessionState::RejectedBadDomain)
            }
            _ => {
                *self.lock_rejected() = None;
                Some(SessionState::Valid)
            }
        }
    }

    fn publish(&self, state: SessionState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            if changed {
                debug!(from = ?*current, to = ?state, "session gate transition");
                *current = state;
            }
            changed
        });
    }

    fn rejected_email(&self) -> Option<String> {
        self.lock_rejected().clone()
    }

    fn lock_rejected(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.rejected_email
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Whether an email address belongs to the allow-listed domain
pub fn email_allowed(email: &str) -> bool {
    email.ends_with(ALLOWED_EMAIL_SUFFIX)
}

fn classify(snapshot: &SessionSnapshot) -> SessionState {
    if !snapshot.ready {
        SessionState::Unknown
    } else if snapshot.identity.is_some() {
        SessionState::PendingDomainCheck
    } else {
        SessionState::Unauthenticated
    }
}

/// What a protected view should do for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewDecision {
    /// Render the view; link params found in the query are handed over and
    /// the query is dropped from the visible location
    Render {
        link_params: Option<LinkParams>,
        replace_location: Option<String>,
    },
    /// Send the visitor to the entry page to log in
    RedirectToEntry { stashed_params: bool },
}

/// Guard for views that require a logged-in user
///
/// Pending `key`/`nick` params are stashed before redirecting so they can
/// be replayed after login.
pub fn guard_protected_view<S: RedirectParamStore>(
    snapshot: &SessionSnapshot,
    query: Option<&str>,
    redirect: &LoginRedirect<S>,
) -> Result<ViewDecision> {
    let link_params = query.and_then(LinkParams::from_query);

    if !snapshot.is_authenticated() {
        let stashed_params = match &link_params {
            Some(params) => redirect.stash(&params.to_redirect_params())?,
            None => false,
        };
        return Ok(ViewDecision::RedirectToEntry { stashed_params });
    }

    let replace_location = link_params.as_ref().map(|_| DASHBOARD_PATH.to_string());
    Ok(ViewDecision::Render {
        link_params,
        replace_location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::link::{MemoryRedirectStore, REDIRECT_PARAMS_KEY};

    fn identity(email: &str) -> SessionIdentity {
        SessionIdentity::new("did:privy:1", "token")
            .with_email(email)
            .with_wallet("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
    }

    #[test]
    fn test_unknown_until_ready() {
        let gate = IdentityGate::new(SessionStore::new());
        assert_eq!(gate.evaluate(), SessionState::Unknown);

        gate.store().mark_ready();
        assert_eq!(gate.evaluate(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_allowed_domain_is_valid() {
        let store = SessionStore::new();
        let gate = IdentityGate::new(store.clone());
        store.login(identity("user@status.im"));

        assert_eq!(gate.evaluate(), SessionState::Valid);
        assert!(store.is_authenticated());
        assert!(gate.rejection_notice().is_none());
        assert_eq!(gate.enforce().unwrap().user_id, "did:privy:1");
    }

    #[test]
    fn test_other_domain_is_rejected_and_logged_out() {
        let store = SessionStore::new();
        let gate = IdentityGate::new(store.clone());
        store.login(identity("user@gmail.com"));

        assert_eq!(gate.evaluate(), SessionState::RejectedBadDomain);
        assert!(!store.is_authenticated());
        assert_eq!(gate.rejection_notice(), Some(REJECTION_NOTICE));

        // No retry: the state holds until dismissed
        assert_eq!(gate.evaluate(), SessionState::RejectedBadDomain);
        match gate.enforce().unwrap_err() {
            BananaError::DomainRejected { email } => assert_eq!(email, "user@gmail.com"),
            other => panic!("unexpected error: {other:?}"),
        }

        gate.dismiss_notice();
        assert_eq!(gate.state(), SessionState::Unauthenticated);
        assert_eq!(gate.evaluate(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_suffix_lookalike_is_rejected() {
        assert!(email_allowed("user@status.im"));
        assert!(!email_allowed("user@status.im.evil.com"));
        assert!(!email_allowed("user@notstatus.io"));
        assert!(!email_allowed("user@STATUS.IM"));
    }

    #[test]
    fn test_fresh_compliant_login_clears_rejection() {
        let store = SessionStore::new();
        let gate = IdentityGate::new(store.clone());
        store.login(identity("user@gmail.com"));
        gate.evaluate();

        store.login(identity("user@status.im"));
        assert_eq!(gate.evaluate(), SessionState::Valid);
        assert!(gate.rejection_notice().is_none());
    }

    #[test]
    fn test_rejection_spares_session_that_replaced_it() {
        let store = SessionStore::new();
        let gate = IdentityGate::new(store.clone());
        store.login(identity("user@gmail.com"));
        let stale = store.snapshot();

        // A compliant login lands between the snapshot and the logout
        store.login(SessionIdentity::new("did:privy:9", "fresh").with_email("user@status.im"));

        assert!(gate.check_domain(&stale).is_none());
        assert!(store.is_authenticated());
        assert!(gate.rejection_notice().is_none());
        assert_eq!(gate.evaluate(), SessionState::Valid);
        assert_eq!(gate.enforce().unwrap().user_id, "did:privy:9");
    }

    #[test]
    fn test_session_without_email_is_not_rejected() {
        let store = SessionStore::new();
        let gate = IdentityGate::new(store.clone());
        store.login(SessionIdentity::new("did:privy:2", "token"));
        assert_eq!(gate.evaluate(), SessionState::Valid);
    }

    #[tokio::test]
    async fn test_run_reacts_to_login() {
        let store = SessionStore::new();
        let gate = std::sync::Arc::new(IdentityGate::new(store.clone()));
        let mut states = gate.subscribe_state();

        let task = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.run().await })
        };

        store.login(identity("user@gmail.com"));
        loop {
            states.changed().await.unwrap();
            if *states.borrow_and_update() == SessionState::RejectedBadDomain {
                break;
            }
        }
        assert!(!store.is_authenticated());

        task.abort();
    }

    #[test]
    fn test_guard_redirects_and_stashes_when_logged_out() {
        let store = SessionStore::new();
        store.mark_ready();
        let redirect = LoginRedirect::new(MemoryRedirectStore::new());
        let key = "d".repeat(64);

        let decision = guard_protected_view(
            &store.snapshot(),
            Some(format!("key={key}&nick=Bob").as_str()),
            &redirect,
        )
        .unwrap();

        assert_eq!(decision, ViewDecision::RedirectToEntry { stashed_params: true });
        assert!(redirect.store().get(REDIRECT_PARAMS_KEY).unwrap().is_some());

        // After login the dashboard gets the params back
        assert_eq!(
            redirect.complete_login().unwrap(),
            format!("/dashboard?key={key}&nick=Bob")
        );
    }

    #[test]
    fn test_guard_redirects_before_provider_ready() {
        let snapshot = SessionSnapshot::default();
        let redirect = LoginRedirect::new(MemoryRedirectStore::new());
        let decision = guard_protected_view(&snapshot, None, &redirect).unwrap();
        assert_eq!(decision, ViewDecision::RedirectToEntry { stashed_params: false });
    }

    #[test]
    fn test_guard_renders_with_link_params() {
        let store = SessionStore::new();
        store.login(identity("user@status.im"));
        let redirect = LoginRedirect::new(MemoryRedirectStore::new());

        let decision =
            guard_protected_view(&store.snapshot(), Some("nick=Bob"), &redirect).unwrap();
        match decision {
            ViewDecision::Render {
                link_params,
                replace_location,
            } => {
                assert_eq!(link_params.unwrap().nickname.as_deref(), Some("Bob"));
                assert_eq!(replace_location.as_deref(), Some("/dashboard"));
            }
            other => panic!("unexpected decision: {other:?}"),
        }

        let plain = guard_protected_view(&store.snapshot(), None, &redirect).unwrap();
        assert_eq!(
            plain,
            ViewDecision::Render {
                link_params: None,
                replace_location: None
            }
        );
    }
}
