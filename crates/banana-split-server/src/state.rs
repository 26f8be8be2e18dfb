/*
[INPUT]:  Validated server configuration
[OUTPUT]: Shared handler state (auth provider client)
[POS]:    Application state - built once at startup
[UPDATE]: When handlers need new shared resources
*/

use std::sync::Arc;

use banana_split_core::{ClientConfig, ProviderClient, Result};
use tracing::info;

use crate::config::ServerConfig;

/// State shared by every request handler
#[derive(Debug)]
pub struct AppState {
    pub provider: ProviderClient,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let provider = ProviderClient::with_config(
            ClientConfig::default(),
            &config.provider.base_url,
            config.provider.credentials(),
        )?;

        let provider = match &config.provider.verification_key {
            Some(pem) => {
                info!("using configured token verification key");
                provider.with_verification_key(pem.clone())
            }
            None => provider,
        };

        Ok(Self::new(provider))
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
