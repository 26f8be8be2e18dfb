/*
[INPUT]:  Link parameters seen before login, a key-value store
[OUTPUT]: Stored redirect params and the post-login dashboard location
[POS]:    Link layer - deep-link replay across a login redirect
[UPDATE]: When storage format or replay target changes
*/

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Storage key the params are kept under between stash and replay
pub const REDIRECT_PARAMS_KEY: &str = "loginRedirectParams";

/// Route reached after a successful login
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Stored form of pending link params: `{key?, nick?}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
}

impl RedirectParams {
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.nick.is_none()
    }

    /// Path plus query for the dashboard with these params reattached
    pub fn dashboard_location(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(key) = &self.key {
            query.append_pair("key", key);
        }
        if let Some(nick) = &self.nick {
            query.append_pair("nick", nick);
        }
        let query = query.finish();
        if query.is_empty() {
            DASHBOARD_PATH.to_string()
        } else {
            format!("{DASHBOARD_PATH}?{query}")
        }
    }
}

/// String key-value storage that survives a login redirect
pub trait RedirectParamStore: Send + Sync {
    fn put(&self, name: &str, value: &str) -> Result<()>;
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn remove(&self, name: &str) -> Result<()>;
}

/// In-process store, for tests and single-process sessions
#[derive(Debug, Default)]
pub struct MemoryRedirectStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryRedirectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RedirectParamStore for MemoryRedirectStore {
    fn put(&self, name: &str, value: &str) -> Result<()> {
        self.entries().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.entries().get(name).cloned())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.entries().remove(name);
        Ok(())
    }
}

/// One JSON file per entry under a directory, readable only by the owner
#[derive(Debug, Clone)]
pub struct FileRedirectStore {
    dir: PathBuf,
}

impl FileRedirectStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the file path an entry is stored at
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl RedirectParamStore for FileRedirectStore {
    fn put(&self, name: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.entry_path(name);
        let tmp = self.dir.join(format!(".{name}.{}.tmp", Uuid::new_v4()));
        if let Err(err) = write_private(&tmp, value).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.entry_path(name)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Create `path` readable only by the owner and write `value` to it
fn write_private(path: &Path, value: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

/// Stashes link params before login and replays them after
pub struct LoginRedirect<S> {
    store: S,
}

impl<S: RedirectParamStore> LoginRedirect<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Remember params for after login; empty params are not written
    pub fn stash(&self, params: &RedirectParams) -> Result<bool> {
        if params.is_empty() {
            return Ok(false);
        }
        let json = serde_json::to_string(params)?;
        self.store.put(REDIRECT_PARAMS_KEY, &json)?;
        debug!(
            has_key = params.key.is_some(),
            has_nick = params.nick.is_some(),
            "stashed login redirect params"
        );
        Ok(true)
    }

    /// Read and delete stashed params
    ///
    /// Unparseable entries are dropped rather than replayed.
    pub fn take(&self) -> Result<Option<RedirectParams>> {
        let Some(raw) = self.store.get(REDIRECT_PARAMS_KEY)? else {
            return Ok(None);
        };
        self.store.remove(REDIRECT_PARAMS_KEY)?;

        match serde_json::from_str::<RedirectParams>(&raw) {
            Ok(params) => Ok(Some(params)),
            Err(err) => {
                warn!(error = %err, "discarding unreadable login redirect params");
                Ok(None)
            }
        }
    }

    /// Where to send the user once login completes
    pub fn complete_login(&self) -> Result<String> {
        let location = self
            .take()?
            .map(|params| params.dashboard_location())
            .unwrap_or_else(|| DASHBOARD_PATH.to_string());
        Ok(location)
    }
}
