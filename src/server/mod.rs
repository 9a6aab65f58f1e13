mod handlers;
mod state;

use axum::routing::{delete, get};
use axum::Router;
use state::AppState;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::session::Session;

pub fn build_router(session: Session) -> Router {
    let state = Arc::new(AppState {
        classifier: session.classifier().clone(),
        session: Mutex::new(session),
    });
    router(state)
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/locations",
            get(handlers::list_locations).post(handlers::add_locations),
        )
        .route("/api/locations/{index}", delete(handlers::remove_location))
        .route("/api/summary", get(handlers::summary))
        .route("/api/classify", get(handlers::classify))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, session: Session) -> anyhow::Result<()> {
    let app = build_router(session);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind to {}: {}", addr, e))?;

    tracing::info!("cep-zones API listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;
    Ok(())
}
