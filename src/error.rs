//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the HTTP surface and
//! the core components, along with `From` mappers that fold the component
//! error taxonomies (auth, store, identity provider) into one HTTP-facing shape.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::clients::sso::SsoError;
use crate::identity::AuthError;
use crate::storage::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Forbidden { code: String, message: String },
    Conflict { code: String, message: String },
    Auth { code: String, message: String },
    Unavailable { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Unavailable { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Unavailable { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn forbidden<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn conflict<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn auth<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn unavailable<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Unavailable { code: code.into(), message: msg.into() } }
    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Unavailable { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => AppError::auth("missing_token", "authentication required"),
            AuthError::InvalidToken => AppError::auth("invalid_token", "invalid auth token"),
            AuthError::MalformedClaim(claim) => AppError::auth("malformed_claim", format!("malformed claim: {}", claim)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AliasExists => AppError::conflict("alias_exists", "alias already exists"),
            StoreError::NotFound => AppError::not_found("url_not_found", "url not found"),
            StoreError::NotOwned => AppError::forbidden("url_not_owned", "url not owned by caller"),
            StoreError::Unavailable(msg) => AppError::unavailable("storage_unavailable", msg),
            StoreError::Internal(e) => AppError::internal("storage_error", e.to_string()),
        }
    }
}

impl From<SsoError> for AppError {
    fn from(err: SsoError) -> Self {
        match err {
            SsoError::Unauthenticated => AppError::auth("invalid_credentials", "invalid credentials"),
            SsoError::AlreadyExists => AppError::conflict("user_exists", "user already exists"),
            SsoError::Unavailable(msg) => AppError::unavailable("sso_unavailable", msg),
            SsoError::DeadlineExceeded => AppError::unavailable("sso_deadline", "identity provider deadline exceeded"),
            SsoError::Internal(msg) => AppError::internal("sso_error", msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({
            "status": "error",
            "error": self.code_str(),
            "message": self.message(),
        }));
        (status, body).into_response()
    }
}
