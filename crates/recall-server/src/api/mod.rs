//! JSON HTTP API
//!
//! Thin presentation layer over recall-core: per review event the handlers
//! load the card's state, call the scheduler, and persist the result. No
//! HTML is rendered here.

pub mod handlers;
pub mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use recall_core::{Scheduler, Store};
use state::AppState;

/// Build the axum router with all API routes
pub fn build_router(store: Arc<Store>, scheduler: Arc<Scheduler>, repos_dir: PathBuf) -> Router {
    let state = AppState::new(store, scheduler, repos_dir);

    let origins = vec![
        "http://127.0.0.1:8080"
            .parse::<axum::http::HeaderValue>()
            .expect("valid origin"),
        "http://localhost:8080"
            .parse::<axum::http::HeaderValue>()
            .expect("valid origin"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        // Health
        .route("/api/health", get(handlers::health_check))
        // Deck + review flow
        .route("/api/deck", get(handlers::get_deck))
        .route("/api/review/next", get(handlers::next_review))
        .route("/api/reviews/{hash}", post(handlers::post_review))
        // Cards
        .route("/api/cards", get(handlers::list_cards))
        .route("/api/cards/{hash}", get(handlers::get_card))
        // Source management
        .route("/api/sources", get(handlers::list_sources))
        .route("/api/sources", post(handlers::add_source))
        .route("/api/sources/{id}", delete(handlers::delete_source))
        // Reconciliation
        .route("/api/sync", post(handlers::post_sync))
        .layer(ServiceBuilder::new().concurrency_limit(50).layer(cors))
        .with_state(state)
}

/// Bind and serve the API (blocks until the server stops)
pub async fn serve(
    store: Arc<Store>,
    scheduler: Arc<Scheduler>,
    repos_dir: PathBuf,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(store, scheduler, repos_dir);

    info!("API listening at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
