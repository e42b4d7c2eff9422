use anyhow::Context;
use application::UserApp;
use config::Config;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
use routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let config = Config::from_env(None)?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    info!("Starting user registry API server");
    info!(environment = ?config.environment, database = %config.database.connection_string, "Configuration loaded");

    let user_app = UserApp::new(&config.database).context("Failed to initialize the database")?;
    let shutdown = CancellationToken::new();
    let app = router(AppState {
        user_app: Arc::new(user_app),
        shutdown: shutdown.clone(),
    });

    // Run the server
    let bind_address = config.server.api_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("API Server listening on http://{}", bind_address);
    info!("   GET    /api/users       - List all users");
    info!("   POST   /api/users       - Create a user");
    info!("   GET    /api/users/:id   - Get user details");
    info!("   PUT    /api/users/:id   - Update a user");
    info!("   DELETE /api/users/:id   - Delete a user");
    info!("   GET    /health          - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, cancelling in-flight requests");
    shutdown.cancel();
}
