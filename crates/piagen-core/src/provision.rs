//! Provisioning workflow: credentials and region in, tunnel configuration out

use piagen_provider::{ConnectionParameters, ProviderClient, ProviderError};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::ProvisioningError;
use crate::render::render;
use crate::sanitize::sanitize;

/// Prefix of every tunnel name
pub const TUNNEL_NAME_PREFIX: &str = "PIA-";

/// A request to provision one tunnel configuration
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub username: String,
    pub password: String,
    pub region: String,
}

impl ProvisioningRequest {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            region: region.into(),
        }
    }

    /// Check that every field is present
    pub fn validate(&self) -> Result<(), ProvisioningError> {
        if self.username.is_empty() || self.password.is_empty() || self.region.is_empty() {
            return Err(ProvisioningError::MissingFields);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProvisioningRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Tunnel name derived from a region label (`PIA-<slug>`)
pub fn tunnel_name(region: &str) -> String {
    format!("{}{}", TUNNEL_NAME_PREFIX, sanitize(region))
}

/// Successful outcome of a provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigResult {
    pub tunnel_name: String,
    pub params: ConnectionParameters,
}

impl ConfigResult {
    /// Download filename, `<tunnel name>.conf`
    pub fn filename(&self) -> String {
        format!("{}.conf", self.tunnel_name)
    }

    /// Render the configuration text
    pub fn render(&self) -> GeneratedConfig {
        GeneratedConfig {
            filename: self.filename(),
            content: render(&self.params, &self.tunnel_name),
        }
    }
}

/// Rendered configuration and the name it should be downloaded as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfig {
    pub filename: String,
    pub content: String,
}

/// Runs the provisioning workflow against an injected provider client
///
/// Holds no per-request state; every call fetches a fresh directory and
/// generates a fresh keypair.
pub struct Provisioner<P: ?Sized> {
    provider: Arc<P>,
}

impl<P: ?Sized> Clone for Provisioner<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}

impl<P: ProviderClient + ?Sized> Provisioner<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Region labels, lexicographically sorted
    pub async fn list_regions(&self) -> Result<Vec<String>, ProvisioningError> {
        let directory = self.provider.list_regions().await.map_err(|e| {
            error!("Failed to retrieve regions: {}", e);
            ProvisioningError::Directory(e)
        })?;

        let labels = directory.labels();
        info!("Retrieved {} available regions", labels.len());
        Ok(labels)
    }

    /// Provision a tunnel configuration
    ///
    /// Steps run strictly in order and the first failure ends the run:
    /// validate fields, load the directory and check the region, generate a
    /// keypair, bind the region, authenticate, register the key.
    pub async fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ConfigResult, ProvisioningError> {
        if let Err(e) = request.validate() {
            warn!("Config generation attempted with missing fields");
            return Err(e);
        }
        let region = request.region.as_str();

        // The same directory is used for the membership check and the binding
        let directory = self.provider.list_regions().await.map_err(|e| {
            error!("Failed to retrieve regions: {}", e);
            ProvisioningError::Directory(e)
        })?;
        if !directory.contains(region) {
            warn!("Invalid region selected: {}", region);
            return Err(ProvisioningError::InvalidRegion(region.to_string()));
        }

        info!("Generating config for region: {}", region);

        let keypair = self.provider.generate_keypair().map_err(|e| {
            error!("Key generation failed: {}", e);
            ProvisioningError::Internal(e.to_string())
        })?;

        let endpoint = self
            .provider
            .select_region(&directory, region)
            .map_err(|e| match e {
                ProviderError::UnknownRegion(r) => ProvisioningError::InvalidRegion(r),
                other => {
                    error!("Failed to select region {}: {}", region, other);
                    ProvisioningError::Internal(other.to_string())
                }
            })?;

        let token = self
            .provider
            .authenticate(&endpoint, &request.username, &request.password)
            .await
            .map_err(|e| match e {
                ProviderError::InvalidCredentials => {
                    warn!("Authentication failed for user: {}", request.username);
                    ProvisioningError::Authentication
                }
                other => {
                    error!("Authentication request failed for region {}: {}", region, other);
                    ProvisioningError::Internal(other.to_string())
                }
            })?;

        let params = self
            .provider
            .register_key(&token, &endpoint, &keypair)
            .await
            .map_err(|e| {
                error!(
                    "Failed to register key with server for region {}: {}",
                    region, e
                );
                ProvisioningError::Registration(e)
            })?;

        Ok(ConfigResult {
            tunnel_name: tunnel_name(region),
            params,
        })
    }
}
