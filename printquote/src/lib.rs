//! # printquote: Instant 3D Print Quotes
//!
//! `printquote` is a small web service that prices 3D prints. A customer uploads a model (STL, OBJ
//! or 3MF) and picks a material; the service computes the model's volume, converts it to a weight
//! using the material's density, and prices the weight at the material's price per gram.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum). Nothing is persisted: each
//! upload is buffered in memory, decoded on a blocking worker and discarded once the quote is sent.
//!
//! - [`mesh`]: decodes model files into an indexed triangle mesh and integrates its volume
//! - [`materials`]: the material table (price per gram, density)
//! - [`quote`]: turns an upload into a [`quote::Quote`]
//! - [`api`]: HTTP handlers and their JSON models
//! - [`config`], [`telemetry`]: configuration loading and tracing setup
//!
//! ## Endpoints
//!
//! - `GET /`: the embedded upload page
//! - `POST /upload`: multipart `file` + `material`, answered with `{"weight", "price"}` or `{"error"}`
//! - `GET /materials`: the material table
//! - `GET /healthz`: liveness probe
//! - `GET /api-docs/openapi.json`, `GET /docs`: OpenAPI document and its rendered form
//! - `GET /internal/metrics`: Prometheus metrics, when `enable_metrics` is set
//!
//! ## Quick Start
//!
//! ```no_run
//! use printquote::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let app = Application::new(config).await?;
//!     app.serve(async { tokio::signal::ctrl_c().await.ok(); }).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod materials;
pub mod mesh;
mod openapi;
pub mod quote;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{
    Json, Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
pub use config::Config;
use config::CorsOrigin;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::openapi::ApiDoc;

/// Application state shared by the router builders.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            // Origins never carry a path; Url renders a bare origin with a trailing slash
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Unmatched paths fall through to the embedded static assets, so `/` serves the quote page.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let config = &state.config;

    let router = Router::new()
        .route("/", get(api::handlers::static_assets::serve_embedded_asset))
        .route(
            "/upload",
            post(api::handlers::quotes::upload).layer(DefaultBodyLimit::max(config.max_upload_size)),
        )
        .route("/materials", get(api::handlers::materials::list_materials))
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback_service(get(api::handlers::static_assets::serve_embedded_asset));

    let mut router = if config.cors.allowed_origins.is_empty() {
        router
    } else {
        router.layer(create_cors_layer(config)?)
    };

    if config.enable_metrics {
        // Installs the global recorder, so at most one metrics-enabled router per process
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The quote service, ready to bind and serve.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance from a loaded configuration
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting printquote with configuration: {:#?}", config);

        let state = AppState::new(config.clone());
        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "printquote listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorsConfig;
    use crate::test_utils::create_test_server;
    use axum::http::StatusCode;
    use url::Url;

    #[tokio::test]
    async fn test_healthz() {
        let server = create_test_server(Config::default());

        let response = server.get("/healthz").await;

        response.assert_status(StatusCode::OK);
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn test_docs_are_served() {
        let server = create_test_server(Config::default());

        let response = server.get("/docs").await;

        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("printquote"));
    }

    #[tokio::test]
    async fn test_metrics_disabled_by_default() {
        let server = create_test_server(Config::default());

        server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_enabled() {
        let config = Config {
            enable_metrics: true,
            ..Config::default()
        };
        let server = create_test_server(config);

        server.get("/healthz").await.assert_status(StatusCode::OK);

        let response = server.get("/internal/metrics").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_allowed_origin() {
        let config = Config {
            cors: CorsConfig {
                allowed_origins: vec![CorsOrigin::Url(Url::parse("https://shop.example.com").unwrap())],
                max_age: Some(600),
            },
            ..Config::default()
        };
        let server = create_test_server(config);

        let response = server.get("/materials").add_header("origin", "https://shop.example.com").await;

        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").map(|v| v.to_str().unwrap()),
            Some("https://shop.example.com")
        );
    }

    #[tokio::test]
    async fn test_no_cors_headers_without_origins() {
        let server = create_test_server(Config::default());

        let response = server.get("/materials").add_header("origin", "https://shop.example.com").await;

        response.assert_status(StatusCode::OK);
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_application_builds_from_config() {
        let app = Application::new(Config::default()).await.unwrap();
        assert_eq!(app.config.bind_address(), "0.0.0.0:5000");
    }
}
