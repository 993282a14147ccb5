use axum::{
    routing::{get, post},
    Router,
};
use nq_core::Result;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/summarize", get(handlers::summarize))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind and serve the API until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "serving HTTP API");
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::AppState;
    pub use nq_core::{Article, Error, Result};
}
