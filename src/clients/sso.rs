//! SSO identity provider client
//! ----------------------------
//! The provider is a black-box collaborator reached over HTTP/JSON. This
//! module owns the contract the rest of the crate consumes: login, register,
//! and the per-operation admin check. Remote failures are folded into a small
//! status taxonomy; transport codes never leak upward.
//!
//! Retry policy: bounded attempt count with a per-attempt timeout. Only the
//! transient classes {unavailable, deadline-exceeded, internal} are retried,
//! and only for idempotent calls. `register` is non-idempotent, so it retries
//! solely on connect-level failures where the request never reached the peer.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SsoError {
    #[error("invalid credentials")]
    Unauthenticated,
    #[error("user already exists")]
    AlreadyExists,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("identity provider deadline exceeded")]
    DeadlineExceeded,
    #[error("identity provider error: {0}")]
    Internal(String),
}

impl SsoError {
    /// Transient classes that are safe to retry for idempotent calls.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SsoError::Unavailable(_) | SsoError::DeadlineExceeded | SsoError::Internal(_)
        )
    }
}

#[async_trait]
pub trait SsoClient: Send + Sync {
    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, SsoError>;
    async fn register(&self, email: &str, password: &str) -> Result<i64, SsoError>;
    async fn is_admin(&self, user_id: i64) -> Result<bool, SsoError>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    user_id: i64,
}

#[derive(Debug, Deserialize)]
struct IsAdminResponse {
    is_admin: bool,
}

/// How a failed attempt may be repeated.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Retry {
    /// Retry any transient failure class.
    Transient,
    /// Retry only connect-level failures (request never sent).
    ConnectOnly,
}

pub struct HttpSsoClient {
    http: reqwest::Client,
    base: String,
    retries: u32,
}

impl HttpSsoClient {
    pub fn new(addr: &str, per_attempt_timeout: Duration, retries: u32) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(per_attempt_timeout)
            .build()?;
        Ok(Self {
            http,
            base: addr.trim_end_matches('/').to_string(),
            retries: retries.max(1),
        })
    }

    fn classify_status(status: reqwest::StatusCode) -> SsoError {
        match status.as_u16() {
            401 => SsoError::Unauthenticated,
            409 => SsoError::AlreadyExists,
            408 | 504 => SsoError::DeadlineExceeded,
            502 | 503 => SsoError::Unavailable(format!("status {}", status.as_u16())),
            s => SsoError::Internal(format!("unexpected status {}", s)),
        }
    }

    /// One remote attempt. Returns the decoded body on 2xx, a classified
    /// error otherwise; the bool reports whether the failure was
    /// connect-level (request provably never reached the peer).
    async fn attempt<T: for<'de> Deserialize<'de>>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, (SsoError, bool)> {
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                let connect = e.is_connect();
                let err = if e.is_timeout() {
                    SsoError::DeadlineExceeded
                } else if connect {
                    SsoError::Unavailable(e.to_string())
                } else {
                    SsoError::Internal(e.to_string())
                };
                return Err((err, connect));
            }
        };
        let status = resp.status();
        if !status.is_success() {
            return Err((Self::classify_status(status), false));
        }
        resp.json::<T>()
            .await
            .map_err(|e| (SsoError::Internal(format!("decode response: {}", e)), false))
    }

    /// Bounded retry loop around `attempt`. Builders are re-created per
    /// attempt via `make` since a `RequestBuilder` is consumed on send.
    async fn call<T, F>(&self, op: &str, retry: Retry, make: F) -> Result<T, SsoError>
    where
        T: for<'de> Deserialize<'de>,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 1u32;
        loop {
            match self.attempt::<T>(make()).await {
                Ok(v) => return Ok(v),
                Err((err, connect)) => {
                    let retryable = match retry {
                        Retry::Transient => err.is_transient(),
                        Retry::ConnectOnly => connect,
                    };
                    if !retryable || attempt >= self.retries {
                        return Err(err);
                    }
                    warn!(op = op, attempt = attempt, error = %err, "sso call failed, retrying");
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl SsoClient for HttpSsoClient {
    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, SsoError> {
        let url = format!("{}/login", self.base);
        let body = json!({"email": email, "password": password, "app_id": app_id});
        let resp: LoginResponse = self
            .call("sso.login", Retry::Transient, || self.http.post(&url).json(&body))
            .await?;
        Ok(resp.token)
    }

    async fn register(&self, email: &str, password: &str) -> Result<i64, SsoError> {
        let url = format!("{}/register", self.base);
        let body = json!({"email": email, "password": password});
        let resp: RegisterResponse = self
            .call("sso.register", Retry::ConnectOnly, || self.http.post(&url).json(&body))
            .await?;
        Ok(resp.user_id)
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, SsoError> {
        let url = format!("{}/is_admin", self.base);
        let resp: IsAdminResponse = self
            .call("sso.is_admin", Retry::Transient, || {
                self.http.get(&url).query(&[("user_id", user_id)])
            })
            .await?;
        Ok(resp.is_admin)
    }
}
