/*
[INPUT]:  Request cookies carrying stashed login redirect params
[OUTPUT]: Request-scoped RedirectParamStore plus the Set-Cookie to persist it
[POS]:    HTTP layer - per-client storage for deep-link replay
[UPDATE]: When cookie name, encoding or lifetime changes
*/

use axum::http::{HeaderMap, HeaderValue};
use banana_split_core::{MemoryRedirectStore, REDIRECT_PARAMS_KEY, RedirectParamStore, Result};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::debug;

use crate::routes::cookie_value;

/// Cookie holding the stashed params, named after the storage key
pub const REDIRECT_COOKIE: &str = REDIRECT_PARAMS_KEY;

/// How long stashed params survive an abandoned login
const REDIRECT_COOKIE_MAX_AGE_SECS: u64 = 600;

/// Redirect storage for one client, loaded from and written back to a cookie
///
/// The cookie value is the stored JSON, base64url encoded.
#[derive(Debug)]
pub struct CookieRedirectStore {
    entries: MemoryRedirectStore,
    loaded: Option<String>,
}

impl CookieRedirectStore {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let loaded = cookie_value(headers, REDIRECT_COOKIE).and_then(|encoded| {
            let decoded = URL_SAFE_NO_PAD
                .decode(encoded)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok());
            if decoded.is_none() {
                debug!("ignoring undecodable redirect cookie");
            }
            decoded
        });

        let entries = MemoryRedirectStore::new();
        if let Some(json) = &loaded {
            // Memory puts cannot fail
            let _ = entries.put(REDIRECT_PARAMS_KEY, json);
        }
        Self { entries, loaded }
    }

    /// Set-Cookie value reflecting changes made during the request
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        let current = self.entries.get(REDIRECT_PARAMS_KEY).ok().flatten();
        if current == self.loaded {
            return None;
        }

        let cookie = match current {
            Some(json) => format!(
                "{REDIRECT_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={REDIRECT_COOKIE_MAX_AGE_SECS}",
                URL_SAFE_NO_PAD.encode(json)
            ),
            None => format!("{REDIRECT_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
        };
        HeaderValue::from_str(&cookie).ok()
    }
}

impl RedirectParamStore for CookieRedirectStore {
    fn put(&self, name: &str, value: &str) -> Result<()> {
        self.entries.put(name, value)
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        self.entries.get(name)
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.entries.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::header::COOKIE;
    use banana_split_core::{LoginRedirect, RedirectParams};

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_untouched_store_sets_no_cookie() {
        let store = CookieRedirectStore::from_headers(&HeaderMap::new());
        assert!(store.set_cookie().is_none());
    }

    #[test]
    fn test_stash_then_load_round_trip() {
        let redirect = LoginRedirect::new(CookieRedirectStore::from_headers(&HeaderMap::new()));
        let params = RedirectParams {
            key: None,
            nick: Some("Bob".to_string()),
        };
        assert!(redirect.stash(&params).unwrap());

        let set_cookie = redirect.store().set_cookie().unwrap();
        let set_cookie = set_cookie.to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        let pair = set_cookie.split(';').next().unwrap();

        let next = LoginRedirect::new(CookieRedirectStore::from_headers(&headers_with(pair)));
        assert_eq!(next.complete_login().unwrap(), "/dashboard?nick=Bob");

        let cleared = next.store().set_cookie().unwrap();
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let store = CookieRedirectStore::from_headers(&headers_with("loginRedirectParams=%%%"));
        assert!(store.get(REDIRECT_PARAMS_KEY).unwrap().is_none());
        assert!(store.set_cookie().is_none());
    }
}
