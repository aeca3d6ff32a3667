//! HTTP surface for the Vitalis assistant.
//!
//! The router exposes chat, streaming chat, user seeding and memory
//! management over JSON. All state lives in the [`Assistant`] handed to
//! [`build_router`].

mod error;
mod routes;
mod state;

pub use error::{ApiError, ServerError};
pub use routes::router;
pub use state::AppState;

use axum::Router;
use log::info;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use vitalis_rs_config::ServerConfig;
use vitalis_rs_core::Assistant;

/// Router with CORS applied according to the server config.
pub fn build_router(assistant: Assistant, config: &ServerConfig) -> Router {
    let app = router(AppState::new(assistant));
    if config.cors_allow_any {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind `config.bind` and serve until `shutdown` resolves.
pub async fn serve<F>(
    assistant: Assistant,
    config: &ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind.clone(),
            source,
        })?;
    let local = listener.local_addr().map_err(ServerError::Serve)?;
    info!(
        "vitalis server listening (addr={}, model={})",
        local,
        assistant.model_id()
    );
    axum::serve(listener, build_router(assistant, config))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;
    info!("vitalis server stopped");
    Ok(())
}
