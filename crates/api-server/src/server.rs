//! HTTP server wiring the recommendation agents behind the REST surface.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use commerce_core::config::AppConfig;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/v1/recommendations/content",
                post(rest::content_recommendations),
            )
            .route(
                "/v1/recommendations/collaborative",
                post(rest::collaborative_recommendations),
            )
            .route(
                "/v1/recommendations/basket",
                post(rest::basket_recommendations),
            )
            .route(
                "/v1/recommendations/context",
                post(rest::context_recommendations),
            )
            .route("/v1/recommendations/all", post(rest::all_recommendations))
            .route("/v1/products/search", get(rest::search_products))
            .route("/health", get(rest::health_check))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
