use anyhow::Result;
use invite_check::{create_app_router, state::AppState};
use shared::Config;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loads .env if present, then reads every setting from the environment
    let config = Config::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.app.log_level))
        .with_ansi(!config.is_production())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🎟️ Starting invitation check service ({})", config.app.environment);

    let app_state = AppState::new(&config).await?;

    let app = create_app_router(Arc::new(app_state));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server running on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("✅ Server shutdown completed");
    Ok(())
}
