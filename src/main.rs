use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use quota_server::config::Args;
use quota_server::logging;
use quota_server::router::create_router;
use quota_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    // parse cli arguments
    let args = Args::parse();
    let state = Arc::new(AppState::from_args(&args)?);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        routes = args.routes,
        rate_limit = args.rate_limit,
        rate_window_secs = args.rate_window,
        delay_secs = args.delay,
        deny_status = args.deny_status,
        "Configuration loaded"
    );

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://localhost:{}", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Quota server stopped");
    Ok(())
}

// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
