//! nbpdf Server
//!
//! Upload a Jupyter notebook, get a PDF back.

use anyhow::Context;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nbpdf_server::config::Config;
use nbpdf_server::convert::select_backend;
use nbpdf_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "nbpdf_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting nbpdf server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Scratch root: {}", config.staging.root.display());
    if !config.conversion.toolchain_path.is_empty() {
        tracing::info!("Toolchain path: {:?}", config.conversion.toolchain_path);
    }

    // Select conversion backend
    let backend = select_backend(&config.conversion).await;
    let kind = backend.kind();

    let host = config.server.host.clone();
    let port = config.server.port;
    let app_state = AppState::new(config, backend).await;
    if app_state.backend_available() {
        tracing::info!("Conversion backend: {}", kind);
    } else {
        tracing::warn!(
            "Conversion backend {} is missing tools; conversions will fail until they are installed",
            kind
        );
    }

    let staging = app_state.converter().staging();
    staging
        .ensure_root()
        .with_context(|| format!("Failed to create scratch root {}", staging.root().display()))?;

    // Build router
    let app = nbpdf_server::app(app_state).layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    tracing::info!("nbpdf server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
