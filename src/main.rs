use std::net::SocketAddr;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use lms::logging::{init_tracing, shutdown_tracer};
use lms::metrics::{init_metrics, metrics_app};
use lms::router::init_router;
use lms::state::init_app_state;
use lms_db::run_migrations;

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_METRICS_PORT: u16 = 9000;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    match init_metrics() {
        Ok(Some(handle)) => {
            let port = std::env::var("METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_METRICS_PORT);
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            tokio::spawn(async move {
                match TcpListener::bind(addr).await {
                    Ok(listener) => {
                        info!(%addr, "Metrics server listening");
                        if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                            error!(error = %e, "Metrics server failed");
                        }
                    }
                    Err(e) => error!(error = %e, %addr, "Failed to bind metrics server"),
                }
            });
        }
        Ok(None) => info!("Observability disabled, metrics server not started"),
        Err(e) => warn!(error = %e, "Failed to install metrics recorder"),
    }

    let state = init_app_state().await?;
    run_migrations(&state.db).await?;
    let app = init_router(state);

    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "🚀 Server running");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown_tracer();
    Ok(())
}
