use anyhow::Context;
use chrono::{Datelike, Utc};
use std::sync::Arc;
use stockroom_api::{
    build_app,
    config::{init_tracing, load_config},
    db,
    events::{process_events, EventSender},
    services::purchase_orders::ensure_po_sequence,
    AppState,
};
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    init_tracing(&config.log_level, config.log_json);

    info!(
        "Starting stockroom-api {} in {} mode",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let pool = db::establish_connection_from_app_config(&config)
        .await
        .context("Failed to connect to the database")?;
    if config.auto_migrate {
        db::run_migrations(&pool).await?;
    }
    db::check_connection(&pool).await?;
    let pool = Arc::new(pool);

    // The current year's PO number sequence is seeded up front so the first
    // concurrent creators of the year never race on the insert.
    ensure_po_sequence(&*pool, Utc::now().year()).await?;

    let (tx, rx) = mpsc::channel(config.event_channel_capacity);
    let event_sender = EventSender::new(tx);
    tokio::spawn(process_events(rx));

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(pool, config, event_sender);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
