/*
[INPUT]:  URL query strings carrying `key` and `nick`
[OUTPUT]: Parsed link parameters with key format validation
[POS]:    Link layer - deep-link parameter parsing
[UPDATE]: When query parameter names or key format rules change
*/

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::redirect::RedirectParams;

static PRIVATE_KEY_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0x)?[0-9a-fA-F]{64}$").expect("private key pattern is valid")
});

/// Whether `key` looks like a raw secp256k1 private key (64 hex chars, optional 0x)
pub fn is_valid_private_key(key: &str) -> bool {
    PRIVATE_KEY_FORMAT.is_match(key)
}

/// Parameters supplied through a shared link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkParams {
    pub raw_private_key_hex: Option<String>,
    pub nickname: Option<String>,
    pub is_valid_key_format: bool,
}

impl LinkParams {
    pub fn new(key: Option<String>, nick: Option<String>) -> Self {
        let key = key.filter(|value| !value.is_empty());
        let nick = nick.filter(|value| !value.is_empty());
        let is_valid_key_format = key.as_deref().is_some_and(is_valid_private_key);
        Self {
            raw_private_key_hex: key,
            nickname: nick,
            is_valid_key_format,
        }
    }

    /// Parse `key` and `nick` out of a query string
    ///
    /// Returns `None` when neither is present. The first occurrence of each
    /// parameter wins.
    pub fn from_query(query: &str) -> Option<Self> {
        let mut key = None;
        let mut nick = None;
        for (name, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match name.as_ref() {
                "key" if key.is_none() => key = Some(value.into_owned()),
                "nick" if nick.is_none() => nick = Some(value.into_owned()),
                _ => {}
            }
        }
        let params = Self::new(key, nick);
        (!params.is_empty()).then_some(params)
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        url.query().and_then(Self::from_query)
    }

    pub fn is_empty(&self) -> bool {
        self.raw_private_key_hex.is_none() && self.nickname.is_none()
    }

    /// The key, only if it passed format validation
    pub fn valid_key(&self) -> Option<&str> {
        if self.is_valid_key_format {
            self.raw_private_key_hex.as_deref()
        } else {
            None
        }
    }

    /// Shape stored across a login redirect
    pub fn to_redirect_params(&self) -> RedirectParams {
        RedirectParams {
            key: self.raw_private_key_hex.clone(),
            nick: self.nickname.clone(),
        }
    }
}

impl From<RedirectParams> for LinkParams {
    fn from(params: RedirectParams) -> Self {
        Self::new(params.key, params.nick)
    }
}
