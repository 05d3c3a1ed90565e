#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the b3-axum crate.
//! [b3_axum]: https://docs.rs/b3_axum/latest/b3_axum/index.html
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod trade_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{Extension, Json, http::Method};
use b3_core::ports::Application;
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Construct a full API router over the given state
pub fn router<T: ApiApplication>(state: T) -> axum::Router {
    let mut api = OpenApi::default();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest("/api/v1/trades", trade_routes::router())
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api)))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: ApiApplication>(
    config: AxumConfig,
    app: T,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    tracing::info!("Listening for requests on {}", listener.local_addr()?);

    let service = router(app);
    axum::serve(listener, service).await
}

/// Everything Axum requires of the state, stated once. With the blanket
/// implementation below, any suitable [`Application`] qualifies.
pub trait ApiApplication:
    Clone + Send + Sync + 'static + Application<Repository: Clone + Send + Sync + 'static>
{
}

impl<T> ApiApplication for T where
    T: Clone + Send + Sync + 'static + Application<Repository: Clone + Send + Sync + 'static>
{
}
