/*
[INPUT]:  HTTP configuration (base URL, timeouts, app credentials)
[OUTPUT]: Verified access token claims and provider user records
[POS]:    HTTP layer - auth provider client
[UPDATE]: When adding provider endpoints or changing client behavior
*/

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{BananaError, Result};
use crate::session::AccessTokenClaims;
use crate::types::{AppSettings, ProviderUser, SessionIdentity};

/// Base URL of the auth provider API
pub const PROVIDER_BASE_URL: &str = "https://auth.privy.io";

/// Issuer claim on every provider access token
pub const PROVIDER_ISSUER: &str = "privy.io";

/// Header carrying the app id on provider requests
pub const APP_ID_HEADER: &str = "privy-app-id";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// App credentials issued by the auth provider
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
}

/// Client for the auth provider's server API
#[derive(Debug)]
pub struct ProviderClient {
    http_client: Client,
    base_url: Url,
    credentials: AppCredentials,
    verification_key: OnceCell<String>,
}

impl ProviderClient {
    /// Create a new client with default configuration
    pub fn new(credentials: AppCredentials) -> Result<Self> {
        Self::with_config(ClientConfig::default(), PROVIDER_BASE_URL, credentials)
    }

    /// Create a new client with custom configuration and base URL
    pub fn with_config(
        config: ClientConfig,
        base_url: &str,
        credentials: AppCredentials,
    ) -> Result<Self> {
        if credentials.app_id.trim().is_empty() {
            return Err(BananaError::Config("app id is required".to_string()));
        }
        if credentials.app_secret.trim().is_empty() {
            return Err(BananaError::Config("app secret is required".to_string()));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            credentials,
            verification_key: OnceCell::new(),
        })
    }

    /// Use a known verification key instead of fetching it
    pub fn with_verification_key(self, pem: impl Into<String>) -> Self {
        Self {
            verification_key: OnceCell::new_with(Some(pem.into())),
            ..self
        }
    }

    pub fn app_id(&self) -> &str {
        &self.credentials.app_id
    }

    /// Build request builder for provider endpoints, authenticated as the app
    pub(crate) fn app_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        Ok(self
            .http_client
            .request(method, url)
            .basic_auth(&self.credentials.app_id, Some(&self.credentials.app_secret))
            .header(APP_ID_HEADER, &self.credentials.app_id))
    }

    /// Fetch app settings, including the token verification key
    ///
    /// GET /api/v1/apps/{app_id}
    pub async fn fetch_app_settings(&self) -> Result<AppSettings> {
        let endpoint = format!("/api/v1/apps/{}", self.credentials.app_id);
        let builder = self.app_request(Method::GET, &endpoint)?;
        send_json(builder).await
    }

    /// Fetch a user record
    ///
    /// GET /api/v1/users/{user_id}
    pub async fn get_user(&self, user_id: &str) -> Result<ProviderUser> {
        let endpoint = format!("/api/v1/users/{user_id}");
        let builder = self.app_request(Method::GET, &endpoint)?;
        send_json(builder).await
    }

    /// Verify an access token's signature, issuer, audience and expiry
    pub async fn verify_auth_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let pem = self
            .verification_key
            .get_or_try_init(|| async {
                let settings = self.fetch_app_settings().await?;
                info!(app_id = %settings.id, "fetched token verification key");
                Ok::<_, BananaError>(settings.verification_key)
            })
            .await?;

        let key = DecodingKey::from_ec_pem(pem.as_bytes())
            .map_err(|e| BananaError::Config(format!("Invalid verification key: {e}")))?;

        let mut validation = Validation::new(Algorithm::ES256);
        validation.set_issuer(&[PROVIDER_ISSUER]);
        validation.set_audience(&[self.credentials.app_id.as_str()]);

        let data = decode::<AccessTokenClaims>(token.trim(), &key, &validation)
            .map_err(|e| BananaError::Unauthorized(format!("access token rejected: {e}")))?;

        debug!(user_id = %data.claims.sub, "access token verified");
        Ok(data.claims)
    }

    /// Verify a token and load the identity of the user it belongs to
    pub async fn resolve_identity(&self, token: &str) -> Result<SessionIdentity> {
        let claims = self.verify_auth_token(token).await?;
        let user = self.get_user(claims.user_id()).await?;
        Ok(user.into_identity(token.trim()))
    }
}

/// Send a request and decode a JSON body, mapping HTTP failures to errors
pub(crate) async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
    let response = builder.send().await?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(BananaError::Unauthorized(body));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BananaError::api_error(status, body));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
