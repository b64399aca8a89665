//!
//! curtail HTTP server
//! -------------------
//! This module defines the Axum-based HTTP API for curtail.
//!
//! Responsibilities:
//! - Login/register endpoints delegating to the SSO identity provider.
//! - Session token transport via an HttpOnly cookie.
//! - Authenticated save/list/delete endpoints over the URL store.
//! - Public redirect endpoint resolving an alias to its target.
//!
//! Requests are handled independently; the only shared state is the store
//! pool and process-wide immutable configuration. Dropping a request future
//! cancels the in-flight SSO call and rolls back any open store transaction.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router, extract::{Path, State}};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::alias;
use crate::clients::sso::{HttpSsoClient, SsoClient};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{Principal, TokenVerifier, authorizer};
use crate::storage::sqlite::SqliteStore;

const AUTH_COOKIE: &str = "auth_token";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SqliteStore,
    pub sso: Arc<dyn SsoClient>,
    pub verifier: Arc<TokenVerifier>,
    pub sso_app_id: i32,
}

/// Start the curtail HTTP server using configuration from the environment.
pub async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    run_with_config(cfg).await
}

pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let store = SqliteStore::new(&cfg.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("while opening url store at {}: {}", cfg.db_path, e))?;
    let sso = HttpSsoClient::new(&cfg.sso.addr, cfg.sso.timeout, cfg.sso.retries)?;

    let state = AppState {
        store,
        sso: Arc::new(sso),
        verifier: Arc::new(TokenVerifier::new(&cfg.app_secret)),
        sso_app_id: cfg.sso.app_id,
    };

    let app = router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Mount all HTTP routes. Split out from `run_with_config` so tests can drive
/// the router directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "curtail ok" }))
        .route("/health", get(health))
        .route("/login", post(login).get(whoami))
        .route("/register", post(register))
        .route("/url", post(save_url).get(list_urls))
        .route("/url/{alias}", delete(delete_url))
        .route("/{alias}", get(redirect))
        .with_state(state)
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name { return Some(v[1..].to_string()); }
        }
    }
    None
}

/// Verify the auth cookie and extract the caller principal. Failures
/// short-circuit before any persistence call.
fn principal_from_headers(state: &AppState, headers: &HeaderMap) -> AppResult<Principal> {
    let token = parse_cookie(headers, AUTH_COOKIE);
    Ok(state.verifier.verify(token.as_deref())?)
}

fn set_auth_cookie(token: &str) -> HeaderValue {
    // HttpOnly cookie scoped to path / with SameSite=Strict; 24h lifetime
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=86400",
        AUTH_COOKIE, token
    ))
    .unwrap()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::user("invalid_email", "a valid email is required"));
    }
    if password.is_empty() {
        return Err(AppError::user("invalid_password", "a password is required"));
    }
    Ok(())
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    validate_credentials(&payload.email, &payload.password)?;
    let token = state
        .sso
        .login(&payload.email, &payload.password, state.sso_app_id)
        .await
        .inspect_err(|e| error!("login failed: {e}"))?;
    info!(email = %payload.email, "login ok");
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", set_auth_cookie(&token));
    Ok((StatusCode::OK, headers, Json(json!({"status": "ok"}))))
}

/// Session introspection: report the principal behind the presented cookie.
async fn whoami(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    Ok(Json(json!({
        "status": "ok",
        "user_id": principal.id,
        "email": principal.email,
    })))
}

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    email: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    validate_credentials(&payload.email, &payload.password)?;
    let user_id = state
        .sso
        .register(&payload.email, &payload.password)
        .await
        .inspect_err(|e| error!("register failed: {e}"))?;
    info!(email = %payload.email, user_id = user_id, "user registered");

    // Log the fresh account in so the client leaves with a session cookie.
    let token = state
        .sso
        .login(&payload.email, &payload.password, state.sso_app_id)
        .await
        .inspect_err(|e| error!("post-register login failed: {e}"))?;
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", set_auth_cookie(&token));
    Ok((StatusCode::CREATED, headers, Json(json!({"status": "ok", "user_id": user_id}))))
}

#[derive(Debug, Deserialize)]
struct SavePayload {
    url: String,
    #[serde(default)]
    alias: Option<String>,
}

async fn save_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SavePayload>,
) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    // Store the normalized form: the parser percent-encodes bytes the raw
    // input may carry, so the stored target is always a valid Location value.
    let target = url::Url::parse(&payload.url)
        .map_err(|_| AppError::user("invalid_url", "url must be absolute"))?;

    let alias = match payload.alias.as_deref() {
        Some(a) if !a.is_empty() => a.to_string(),
        _ => alias::generate(alias::DEFAULT_LEN),
    };

    let id = state.store.save_url(target.as_str(), &alias, principal.id).await?;
    info!(alias = %alias, id = id, user_id = principal.id, "url added");
    Ok((StatusCode::OK, Json(json!({"status": "ok", "alias": alias, "id": id}))))
}

async fn list_urls(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    let urls = state.store.get_user_urls(principal.id).await?;
    Ok(Json(json!({"status": "ok", "urls": urls})))
}

async fn delete_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(alias): Path<String>,
) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    authorizer::delete_url(&state.store, state.sso.as_ref(), &alias, principal.id).await?;
    Ok(Json(json!({"status": "ok"})))
}

/// Public resolution path: no ownership filter, unknown alias is 404.
/// Responds 302 Found; the Location header is built fallibly so a bad stored
/// target surfaces as an error instead of a panic.
async fn redirect(State(state): State<AppState>, Path(alias): Path<String>) -> AppResult<impl IntoResponse> {
    let target = state.store.get_url(&alias).await?;
    let location = HeaderValue::from_str(&target)
        .map_err(|_| AppError::internal("invalid_target", "stored target is not a valid location"))?;
    info!(alias = %alias, "redirecting");
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}
