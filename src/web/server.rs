//! Web server setup: routes, CORS, listener.
//!
//! The frontend at `/` talks to the `/api/*` endpoints; a separately
//! hosted frontend is supported through the configured CORS origins.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::core::config;
use crate::download::task::TaskRegistry;
use crate::web::handlers;

/// Shared state for the web server.
#[derive(Clone)]
pub struct WebState {
    pub registry: Arc<TaskRegistry>,
}

/// Builds the router with all routes and the CORS layer.
pub fn build_router(state: WebState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/api/info", post(handlers::info_handler))
        .route("/api/download", post(handlers::download_handler))
        .route("/api/status/{task_id}", get(handlers::status_handler))
        .route("/api/fetch/{task_id}", get(handlers::fetch_handler))
        .route("/health", get(handlers::health_handler))
        .layer(cors_layer())
        .with_state(state)
}

/// CORS for a separately-hosted frontend.
///
/// tower-http rejects wildcard origins combined with credentials, so the
/// allowed origins are always an explicit list.
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::CORS_ALLOWED_ORIGINS
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Starts the web server and serves until shutdown.
pub async fn start_web_server(host: &str, port: u16, registry: Arc<TaskRegistry>) -> anyhow::Result<()> {
    let ip: std::net::IpAddr = host.parse()?;
    let addr = SocketAddr::new(ip, port);
    let state = WebState { registry };
    let app = build_router(state);

    log::info!("Starting web server on http://{}", addr);
    log::info!("  /                     - Frontend (HTML)");
    log::info!("  /api/info             - Video metadata (POST)");
    log::info!("  /api/download         - Start a download (POST)");
    log::info!("  /api/status/{{task_id}} - Task status");
    log::info!("  /api/fetch/{{task_id}}  - Fetch the finished file");
    log::info!("  /health               - Health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
