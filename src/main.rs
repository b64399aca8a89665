use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = std::env::var("CURTAIL_HTTP_PORT").unwrap_or_else(|_| "8080".to_string());
    let db_path = std::env::var("CURTAIL_DB_PATH").unwrap_or_else(|_| "curtail.db".to_string());
    let sso_addr = std::env::var("CURTAIL_SSO_ADDR").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "curtail",
        "curtail starting: RUST_LOG='{}', http_port={}, db_path='{}', sso_addr='{}'",
        rust_log, http_port, db_path, sso_addr
    );

    curtail::server::run().await
}
