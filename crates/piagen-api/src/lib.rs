//! HTTP service that turns PIA credentials into a WireGuard config download

pub mod artifact;
pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use piagen_core::Provisioner;
use piagen_provider::ProviderClient;
use rust_embed::RustEmbed;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;

pub use artifact::{with_artifact, ArtifactError, TemporaryArtifact};
pub use error::ApiError;

#[derive(RustEmbed)]
#[folder = "assets"]
struct LandingAssets;

/// Application state shared across handlers
pub struct AppState {
    pub provisioner: Provisioner<dyn ProviderClient>,
    /// Directory temporary config files are written to
    pub artifact_dir: PathBuf,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PIA WireGuard Config API",
        version = "0.1.0",
        description = "Generates WireGuard configurations for Private Internet Access"
    ),
    paths(
        handlers::list_regions,
        handlers::generate_config,
        handlers::health_check,
    ),
    components(
        schemas(
            models::GenerateConfigForm,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "provisioning", description = "Region listing and config generation"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable permissive CORS (for development)
    pub enable_cors: bool,
    /// Directory for temporary config files
    pub artifact_dir: PathBuf,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            enable_cors: false,
            artifact_dir: std::env::temp_dir(),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server around an injected provider client
    pub fn new(config: ApiServerConfig, provider: Arc<dyn ProviderClient>) -> Self {
        let state = Arc::new(AppState {
            provisioner: Provisioner::new(provider),
            artifact_dir: config.artifact_dir.clone(),
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/", get(serve_landing))
            .route("/regions", get(handlers::list_regions))
            .route("/generate", post(handlers::generate_config))
            .route("/health", get(handlers::health_check))
            .route("/openapi.json", get(openapi_spec))
            .fallback(serve_landing)
            .with_state(self.state.clone());

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "Temporary configs are written to {}",
            self.config.artifact_dir.display()
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serve the embedded landing page and its assets
async fn serve_landing(req: axum::extract::Request) -> impl IntoResponse {
    let path = req.uri().path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    if let Some(content) = LandingAssets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let mut response = Response::new(Body::from(content.data.to_vec()));
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        return response;
    }

    let mut response = Response::new(Body::from("Not Found"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}
