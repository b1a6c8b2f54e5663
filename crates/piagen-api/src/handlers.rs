use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::Response,
    Form, Json,
};
use piagen_core::ProvisioningRequest;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::artifact::{file_download, with_artifact};
use crate::error::ApiError;
use crate::models::*;
use crate::AppState;

/// List the provider's regions
#[utoipa::path(
    get,
    path = "/regions",
    responses(
        (status = 200, description = "Region labels, sorted", body = Vec<String>),
        (status = 500, description = "Region directory unavailable", body = ErrorResponse)
    ),
    tag = "provisioning"
)]
pub async fn list_regions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    debug!("Listing regions");

    let regions = state.provisioner.list_regions().await?;
    Ok(Json(regions))
}

/// Generate a WireGuard config and return it as a download
#[utoipa::path(
    post,
    path = "/generate",
    request_body(
        content = GenerateConfigForm,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "WireGuard config file", content_type = "text/plain", body = String),
        (status = 400, description = "Missing fields or unknown region", body = ErrorResponse),
        (status = 401, description = "Credentials rejected", body = ErrorResponse),
        (status = 500, description = "Key registration or internal failure", body = ErrorResponse)
    ),
    tag = "provisioning"
)]
pub async fn generate_config(
    State(state): State<Arc<AppState>>,
    form: Result<Form<GenerateConfigForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!("Unreadable generate form: {}", rejection);
            GenerateConfigForm::default()
        }
    };

    let request = ProvisioningRequest::new(form.username, form.password, form.region);
    let result = state.provisioner.provision(&request).await?;
    let config = result.render();

    let filename = config.filename.clone();
    let response = with_artifact(&state.artifact_dir, &config.content, |path| async move {
        file_download(&path, &filename).await
    })
    .await?;

    info!("Config generated successfully for region: {}", request.region);
    Ok(response)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
