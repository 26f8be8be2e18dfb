/*
[INPUT]:  Optional YAML configuration file, BANANA_SPLIT__* environment
[OUTPUT]: Validated server configuration
[POS]:    Configuration layer - bind address and auth provider credentials
[UPDATE]: When adding new configuration options
*/

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, bail};
use banana_split_core::AppCredentials;
use banana_split_core::http::client::PROVIDER_BASE_URL;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `BANANA_SPLIT__PROVIDER__APP_ID`
pub const ENV_PREFIX: &str = "BANANA_SPLIT";

const ENV_SEPARATOR: &str = "__";

/// Top-level configuration for the server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Auth provider settings
    pub provider: ProviderConfig,
}

/// Auth provider credentials and endpoint
#[derive(Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub app_id: String,
    pub app_secret: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// PEM public key for token verification, fetched from the provider when unset
    #[serde(default)]
    pub verification_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("verification_key", &self.verification_key.is_some())
            .finish()
    }
}

impl ProviderConfig {
    pub fn credentials(&self) -> AppCredentials {
        AppCredentials {
            app_id: self.app_id.clone(),
            app_secret: self.app_secret.clone(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_base_url() -> String {
    PROVIDER_BASE_URL.to_string()
}

impl ServerConfig {
    /// Load from an optional YAML file, then the process environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_env(path, environment())
    }

    /// Load with an explicit environment source
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }

        let config: Self = builder
            .add_source(env)
            .build()
            .context("read configuration sources")?
            .try_deserialize()
            .context("parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider.app_id.trim().is_empty() {
            bail!("provider.app_id must not be empty");
        }
        if self.provider.app_secret.trim().is_empty() {
            bail!("provider.app_secret must not be empty");
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("invalid bind_addr {:?}", self.bind_addr))
    }
}

/// `BANANA_SPLIT__SECTION__KEY` environment source
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
}
