//! Sysprop server library
//!
//! Serves registered tools over HTTP: a JSON RPC interface with a discovery
//! document for programs, and form endpoints that render results in any
//! registered output format.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod tools;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use state::AppState;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// The complete application with its middleware
pub fn router(state: AppState) -> Router {
    let limit = state.config.max_body_bytes;
    Router::new()
        .merge(handlers::routes())
        .layer(DefaultBodyLimit::max(limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the sysprop server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    use std::net::SocketAddr;

    tracing::info!("Starting sysprop server on {}", config.bind_address);

    // Parse address
    let addr: SocketAddr = config.bind_address.parse()?;

    // Create app state
    let state = AppState::new(config)?;
    tracing::info!(tools = ?state.tools.list_tools(), "tools registered");

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
