//! Provider client trait
//!
//! The provisioning workflow only talks to the provider through this trait, so
//! it can be driven by the live HTTPS client or by an in-memory double.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::keys;
use crate::types::{AuthToken, ConnectionParameters, Keypair, RegionDirectory, RegionEndpoint};

/// Operations required from a VPN provider, in the order a provisioning run calls them
///
/// Implementations must not retry internally. Each call is a single attempt
/// and any timeout policy lives inside the implementation.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Fetch the current region directory
    async fn list_regions(&self) -> Result<RegionDirectory, ProviderError>;

    /// Generate a keypair for a single provisioning run
    fn generate_keypair(&self) -> Result<Keypair, ProviderError> {
        keys::generate_keypair()
    }

    /// Bind a region of `directory` to the servers used for the run (no I/O)
    fn select_region(
        &self,
        directory: &RegionDirectory,
        region: &str,
    ) -> Result<RegionEndpoint, ProviderError> {
        RegionEndpoint::select(directory, region)
    }

    /// Exchange credentials for a session token
    ///
    /// Returns [`ProviderError::InvalidCredentials`] when the provider rejects
    /// the credentials and [`ProviderError::Transport`] when it cannot be reached.
    async fn authenticate(
        &self,
        endpoint: &RegionEndpoint,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, ProviderError>;

    /// Register the public half of `keypair` with the region's WireGuard server
    async fn register_key(
        &self,
        token: &AuthToken,
        endpoint: &RegionEndpoint,
        keypair: &Keypair,
    ) -> Result<ConnectionParameters, ProviderError>;
}
