/*
[INPUT]:  HTTP requests (bearer tokens, session cookies, query strings, JSON bodies)
[OUTPUT]: Verified claims, gated identities, dashboard views, signature and link-proof checks
[POS]:    HTTP layer - route handlers and router assembly
[UPDATE]: When adding endpoints or changing request/response shapes
*/

use axum::extract::{RawQuery, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use banana_split_core::link::redirect::DASHBOARD_PATH;
use banana_split_core::signing::codec::checksum_address;
use banana_split_core::{
    AccessTokenClaims, BananaError, ENTRY_PATH, IdentityGate, LinkParams, LinkProof,
    LoginRedirect, SessionIdentity, SessionSnapshot, SessionState, SessionStore, SignatureResult,
    ViewDecision, addresses_match, guard_protected_view, prove, recover_signer,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::redirect_cookie::CookieRedirectStore;
use crate::state::SharedState;

/// Cookie holding the provider access token
pub const SESSION_COOKIE: &str = "privy-token";

/// Assemble the application router
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(ENTRY_PATH, get(entry))
        .route(DASHBOARD_PATH, get(dashboard))
        .route("/api/verify", get(verify_token))
        .route("/api/session", get(session))
        .route("/api/signature/verify", post(verify_signature))
        .route("/api/link-proof", post(link_proof))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET / - replay stashed params for logged-in visitors, stash them otherwise
async fn entry(
    State(state): State<SharedState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let redirect = LoginRedirect::new(CookieRedirectStore::from_headers(&headers));

    if let Some(token) = cookie_value(&headers, SESSION_COOKIE) {
        match state.provider.verify_auth_token(token).await {
            Ok(claims) => {
                let location = redirect.complete_login()?;
                info!(user_id = %claims.user_id(), "session cookie verified, redirecting");
                let response = Redirect::temporary(&location).into_response();
                return Ok(with_redirect_cookie(response, redirect.store()));
            }
            Err(err) => debug!(error = %err, "session cookie did not verify"),
        }
    }

    let stashed_params = match query.as_deref().and_then(LinkParams::from_query) {
        Some(params) => redirect.stash(&params.to_redirect_params())?,
        None => false,
    };
    let body = Json(serde_json::json!({
        "authenticated": false,
        "stashedParams": stashed_params,
    }));
    Ok(with_redirect_cookie(body.into_response(), redirect.store()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub identity: SessionIdentity,
    pub link_params: Option<LinkParams>,
    pub link_proof: Option<LinkProof>,
    /// Location the client should show instead of the one it requested
    pub replace_location: Option<String>,
}

/// GET /dashboard - protected view; logged-out visitors go to the entry page
async fn dashboard(
    State(state): State<SharedState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let snapshot = cookie_session(&state, &headers).await?;
    let redirect = LoginRedirect::new(CookieRedirectStore::from_headers(&headers));

    let response = match guard_protected_view(&snapshot, query.as_deref(), &redirect)? {
        ViewDecision::RedirectToEntry { stashed_params } => {
            debug!(stashed_params, "not logged in, redirecting to entry");
            Redirect::temporary(ENTRY_PATH).into_response()
        }
        ViewDecision::Render {
            link_params,
            replace_location,
        } => {
            let link_proof = match (&link_params, snapshot.primary_wallet()) {
                (Some(params), Some(wallet)) => prove(params, wallet),
                _ => None,
            };
            let identity = snapshot
                .identity
                .ok_or_else(|| BananaError::Unauthorized("session ended during check".into()))?;
            Json(DashboardResponse {
                identity,
                link_params,
                link_proof,
                replace_location,
            })
            .into_response()
        }
    };
    Ok(with_redirect_cookie(response, redirect.store()))
}

/// GET /api/verify
async fn verify_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Json<AccessTokenClaims>> {
    let token = bearer_token(&headers)?;
    let claims = state.provider.verify_auth_token(token).await?;
    Ok(Json(claims))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub state: SessionState,
    pub identity: SessionIdentity,
}

/// GET /api/session - verify, load the user, apply the email-domain gate
async fn session(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    let token = bearer_token(&headers)?;
    let identity = gated_identity(&state, token).await?;

    Ok(Json(SessionResponse {
        state: SessionState::Valid,
        identity,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureCheck {
    pub message: String,
    pub signature: String,
    pub expected_address: String,
}

/// POST /api/signature/verify
async fn verify_signature(Json(check): Json<SignatureCheck>) -> ApiResult<Json<SignatureResult>> {
    checksum_address(&check.expected_address)?;

    let recovered_signer_address = match recover_signer(&check.message, &check.signature) {
        Ok(address) => Some(address),
        Err(err) => {
            debug!(error = %err, "signature did not recover");
            None
        }
    };
    let matches_expected_signer = recovered_signer_address
        .as_deref()
        .is_some_and(|recovered| addresses_match(recovered, &check.expected_address));

    Ok(Json(SignatureResult {
        signature_hex: check.signature,
        recovered_signer_address,
        matches_expected_signer,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LinkProofRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub nick: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkProofResponse {
    pub wallet_address: String,
    pub params: LinkParams,
    pub proof: Option<LinkProof>,
}

/// POST /api/link-proof - prove the link key against the caller's session wallet
async fn link_proof(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(request): Json<LinkProofRequest>,
) -> ApiResult<Json<LinkProofResponse>> {
    let token = bearer_token(&headers)?;
    let identity = gated_identity(&state, token).await?;
    let wallet_address = identity
        .primary_wallet()
        .ok_or_else(|| ApiError::BadRequest("session has no linked wallet".into()))?
        .to_string();

    let params = LinkParams::new(request.key, request.nick);
    let proof = prove(&params, &wallet_address);
    Ok(Json(LinkProofResponse {
        wallet_address,
        params,
        proof,
    }))
}

/// Resolve a token to an identity that passed the email-domain gate
async fn gated_identity(state: &SharedState, token: &str) -> ApiResult<SessionIdentity> {
    let identity = state.provider.resolve_identity(token).await?;

    let store = SessionStore::new();
    let gate = IdentityGate::new(store.clone());
    store.login(identity);
    Ok(gate.enforce()?)
}

/// Session for a browser navigation, from the session cookie
///
/// A missing or unverifiable cookie is a logged-out session, not an error.
async fn cookie_session(state: &SharedState, headers: &HeaderMap) -> ApiResult<SessionSnapshot> {
    let store = SessionStore::new();
    store.mark_ready();

    let Some(token) = cookie_value(headers, SESSION_COOKIE) else {
        return Ok(store.snapshot());
    };
    match gated_identity(state, token).await {
        Ok(identity) => store.login(identity),
        Err(ApiError::Core(BananaError::Unauthorized(reason))) => {
            debug!(reason = %reason, "session cookie did not verify");
        }
        Err(err) => return Err(err),
    }
    Ok(store.snapshot())
}

fn with_redirect_cookie(mut response: Response, store: &CookieRedirectStore) -> Response {
    if let Some(cookie) = store.set_cookie() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingBearer)
}

/// Value of the named cookie, if present and non-empty
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(cookie, _)| *cookie == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(ApiError::MissingBearer)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        assert!(cookie_value(&headers, SESSION_COOKIE).is_none());

        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; privy-token=abc.def.ghi; other=1"),
        );
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "other"), Some("1"));

        headers.insert(COOKIE, HeaderValue::from_static("privy-token-old=x; privy-token="));
        assert!(cookie_value(&headers, SESSION_COOKIE).is_none());
    }
}
