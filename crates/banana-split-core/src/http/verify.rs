/*
[INPUT]:  The app's own base URL and a bearer access token
[OUTPUT]: Opaque verification result from GET /api/verify
[POS]:    HTTP layer - debug client for the token verification endpoint
[UPDATE]: When the verification endpoint path or auth scheme changes
*/

use reqwest::{Client, Method, Url};
use tracing::{info, warn};

use crate::error::Result;
use crate::http::client::{ClientConfig, send_json};
use crate::session::AccessTokenStore;

/// Path of the token verification endpoint
pub const VERIFY_PATH: &str = "/api/verify";

/// Calls the app's verification endpoint with the current access token
#[derive(Debug)]
pub struct VerifyClient {
    http_client: Client,
    base_url: Url,
}

impl VerifyClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), base_url)
    }

    pub fn with_config(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// GET /api/verify with `Authorization: Bearer <token>`
    pub async fn verify_token(&self, token: &str) -> Result<serde_json::Value> {
        let url = self.base_url.join(VERIFY_PATH)?;
        let builder = self
            .http_client
            .request(Method::GET, url)
            .bearer_auth(token);
        send_json(builder).await
    }

    /// Verify whatever token the store holds, logging the outcome
    ///
    /// Failures are logged and swallowed; this backs a debug action only.
    pub async fn verify_current(&self, tokens: &AccessTokenStore) -> Option<serde_json::Value> {
        let Some(token) = tokens.get_token() else {
            warn!("no access token to verify");
            return None;
        };

        match self.verify_token(&token).await {
            Ok(response) => {
                info!(response = %response, "verification response");
                Some(response)
            }
            Err(err) => {
                warn!(error = %err, "token verification call failed");
                None
            }
        }
    }
}
