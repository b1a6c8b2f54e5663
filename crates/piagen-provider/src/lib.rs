//! Provider client for PIA WireGuard provisioning
//!
//! Defines the contract the provisioning workflow consumes (region directory,
//! keypair generation, region binding, token exchange, key registration), the
//! data types flowing through it, and a live HTTPS implementation.

pub mod client;
pub mod error;
pub mod keys;
pub mod pia;
#[cfg(any(test, feature = "stub"))]
pub mod stub;
pub mod types;

pub use client::ProviderClient;
pub use error::ProviderError;
pub use keys::generate_keypair;
pub use pia::{PiaClient, PiaClientConfig, DEFAULT_SERVERLIST_URL};
pub use types::{
    AuthToken, ConnectionParameters, Keypair, Region, RegionDirectory, RegionEndpoint, ServerNode,
};

// Re-export so implementors don't need a direct dependency
pub use async_trait::async_trait;
