use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use piagen_core::{ErrorKind, ProvisioningError};
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::models::ErrorResponse;

/// Any failure a handler can report
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Provisioning(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Auth => StatusCode::UNAUTHORIZED,
                ErrorKind::Registration | ErrorKind::Directory | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Artifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
