//! Edge gateway: the point nearest the network edge where admission runs
//! before any page-specific logic. Page rendering itself is an external
//! collaborator; a placeholder handler stands in for it here.

use crate::admission::{layer::admission_middleware, RouteTables};
use anyhow::Result;
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn serve(port: u16, tables: RouteTables) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("edge gateway listening on port {port}");

    let app = router(Arc::new(tables));

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

pub fn router(tables: Arc<RouteTables>) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .fallback(page)
        .layer(middleware::from_fn_with_state(tables, admission_middleware))
        .layer(TraceLayer::new_for_http())
}

// axum handler for health
async fn health() -> impl IntoResponse {
    let body = Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }));

    let mut headers = HeaderMap::new();
    let app = format!("{}:{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if let Ok(value) = HeaderValue::from_str(&app) {
        headers.insert("X-App", value);
    }

    (headers, body)
}

// Stand-in for the upstream page renderer; admission has already run.
async fn page(uri: Uri) -> impl IntoResponse {
    (StatusCode::OK, format!("parlo:{}", uri.path()))
}
