//! Process configuration
//! ---------------------
//! Loaded once at startup from environment variables and treated as immutable
//! for the process lifetime. The token verification secret is injected into
//! the verifier's constructor rather than read ambiently by callers.

use std::time::Duration;

use anyhow::{Result, bail};

/// Connection settings for the external SSO identity provider.
#[derive(Debug, Clone)]
pub struct SsoConfig {
    pub addr: String,
    /// Per-attempt timeout for remote calls.
    pub timeout: Duration,
    /// Bounded attempt count for retryable calls.
    pub retries: u32,
    pub app_id: i32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_port: u16,
    pub db_path: String,
    /// Shared secret used to verify session token signatures.
    pub app_secret: String,
    pub sso: SsoConfig,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let app_secret = std::env::var("CURTAIL_APP_SECRET").unwrap_or_default();
        if app_secret.is_empty() {
            bail!("CURTAIL_APP_SECRET is not set");
        }
        let sso_addr = std::env::var("CURTAIL_SSO_ADDR").unwrap_or_default();
        if sso_addr.is_empty() {
            bail!("CURTAIL_SSO_ADDR is not set");
        }

        let http_port = env_or("CURTAIL_HTTP_PORT", "8080").parse::<u16>().unwrap_or(8080);
        let db_path = env_or("CURTAIL_DB_PATH", "curtail.db");
        let timeout_ms = env_or("CURTAIL_SSO_TIMEOUT_MS", "4000").parse::<u64>().unwrap_or(4000);
        let retries = env_or("CURTAIL_SSO_RETRIES", "3").parse::<u32>().unwrap_or(3);
        let app_id = env_or("CURTAIL_SSO_APP_ID", "1").parse::<i32>().unwrap_or(1);

        Ok(Self {
            http_port,
            db_path,
            app_secret,
            sso: SsoConfig {
                addr: sso_addr,
                timeout: Duration::from_millis(timeout_ms),
                retries,
                app_id,
            },
        })
    }
}
