//! Articles API server.
//!
//! Configuration is read from `config/default` (optional) and `APP_*`
//! environment variables, e.g. `APP_PORT=8080`.

use anyhow::Result;
use articles_api_rest::{create_app, ApiConfig};
use articles_common::init_tracing;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ApiConfig::load()?;

    init_tracing(&config.app_name, config.log_json, &config.log_level)?;

    info!(
        address = %config.server_address(),
        root_url = %config.root_url,
        swagger = config.enable_swagger,
        "Starting articles API server"
    );

    let app = create_app(config.clone()).await?;
    let listener = tokio::net::TcpListener::bind(&config.server_address()).await?;

    if config.enable_swagger {
        info!(url = %format!("{}/ui/", config.api_doc_url), "Swagger UI enabled");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
