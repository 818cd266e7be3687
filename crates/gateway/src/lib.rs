//! API Gateway Library
//!
//! HTTP surface for the authentication subsystem: registration, login,
//! signout, the current-session endpoint, health and OpenAPI docs.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use auth_service_lib::config::AuthServiceConfig;
use auth_service_lib::AuthModule;

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Wire everything and serve HTTP until Ctrl-C.
pub async fn run(
    config: GatewayConfig,
    auth_config: AuthServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let auth = AuthModule::from_config(&auth_config).await?;
    let state = AppState::new(auth, config.clone());

    let sweeper = spawn_sweeper(state.clone(), config.sweep_interval);
    let app = create_router(state);

    let addr: SocketAddr = config.server.addr().parse()?;
    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("Gateway stopped");
    Ok(())
}

/// Periodically evict expired revocation entries and idle rate-limit windows.
pub fn spawn_sweeper(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let report = state.sweep();
            debug!(
                revocations = report.revocations,
                rate_limit_windows = report.rate_limit_windows,
                remaining_revocations = state.revocations.len(),
                "Sweep finished"
            );
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
