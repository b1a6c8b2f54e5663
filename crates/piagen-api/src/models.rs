use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form submitted to `POST /generate`
///
/// Every field defaults to empty so that a missing field is reported as a
/// validation error rather than a form rejection.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct GenerateConfigForm {
    /// Provider account username
    #[serde(default)]
    pub username: String,
    /// Provider account password
    #[serde(default)]
    pub password: String,
    /// Region label as returned by `GET /regions`
    #[serde(default)]
    pub region: String,
}

impl std::fmt::Debug for GenerateConfigForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateConfigForm")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
