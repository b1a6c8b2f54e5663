//! In-memory provider double
//!
//! Answers every call from fixed data and counts invocations, so tests can
//! assert which steps of a provisioning run were reached.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::client::ProviderClient;
use crate::error::ProviderError;
use crate::keys;
use crate::types::{
    AuthToken, ConnectionParameters, Keypair, Region, RegionDirectory, RegionEndpoint, ServerNode,
};

/// Outcome of the token exchange
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Accept,
    Reject,
    Unreachable,
}

/// Per-operation call counts
#[derive(Debug, Default)]
pub struct CallCounts {
    list_regions: AtomicUsize,
    generate_keypair: AtomicUsize,
    select_region: AtomicUsize,
    authenticate: AtomicUsize,
    register_key: AtomicUsize,
}

impl CallCounts {
    pub fn list_regions(&self) -> usize {
        self.list_regions.load(Ordering::SeqCst)
    }

    pub fn generate_keypair(&self) -> usize {
        self.generate_keypair.load(Ordering::SeqCst)
    }

    pub fn select_region(&self) -> usize {
        self.select_region.load(Ordering::SeqCst)
    }

    pub fn authenticate(&self) -> usize {
        self.authenticate.load(Ordering::SeqCst)
    }

    pub fn register_key(&self) -> usize {
        self.register_key.load(Ordering::SeqCst)
    }

    /// Sum of all recorded calls
    pub fn total(&self) -> usize {
        self.list_regions()
            + self.generate_keypair()
            + self.select_region()
            + self.authenticate()
            + self.register_key()
    }
}

/// Provider double driven by fixed responses
#[derive(Debug)]
pub struct StubProvider {
    regions: Vec<String>,
    directory_error: Option<String>,
    auth: AuthOutcome,
    registration_error: Option<String>,
    local_address: String,
    dns_servers: Vec<String>,
    server_public_key: String,
    server_ip: String,
    calls: CallCounts,
}

impl Default for StubProvider {
    fn default() -> Self {
        Self {
            regions: vec!["US East".to_string(), "DE Berlin".to_string()],
            directory_error: None,
            auth: AuthOutcome::Accept,
            registration_error: None,
            local_address: "10.6.0.5/32".to_string(),
            dns_servers: vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            server_public_key: "c2VydmVyLXB1YmxpYy1rZXktYmFzZTY0LWVuY29kZWQ=".to_string(),
            server_ip: "203.0.113.10".to_string(),
            calls: CallCounts::default(),
        }
    }
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the region labels the directory contains
    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// Make `list_regions` fail
    pub fn with_directory_error(mut self, message: impl Into<String>) -> Self {
        self.directory_error = Some(message.into());
        self
    }

    pub fn with_auth(mut self, outcome: AuthOutcome) -> Self {
        self.auth = outcome;
        self
    }

    /// Make `register_key` fail
    pub fn with_registration_error(mut self, message: impl Into<String>) -> Self {
        self.registration_error = Some(message.into());
        self
    }

    pub fn with_local_address(mut self, address: impl Into<String>) -> Self {
        self.local_address = address.into();
        self
    }

    pub fn with_dns_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dns_servers = servers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_server(mut self, public_key: impl Into<String>, ip: impl Into<String>) -> Self {
        self.server_public_key = public_key.into();
        self.server_ip = ip.into();
        self
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    fn directory(&self) -> RegionDirectory {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, name)| Region {
                id: name.to_lowercase().replace(' ', "_"),
                name: name.clone(),
                meta: vec![ServerNode {
                    ip: format!("198.51.100.{}", i + 1),
                    cn: format!("meta{}", i + 1),
                }],
                wg: vec![ServerNode {
                    ip: self.server_ip.clone(),
                    cn: format!("wg{}", i + 1),
                }],
            })
            .collect()
    }
}

#[async_trait]
impl ProviderClient for StubProvider {
    async fn list_regions(&self) -> Result<RegionDirectory, ProviderError> {
        self.calls.list_regions.fetch_add(1, Ordering::SeqCst);
        match &self.directory_error {
            Some(message) => Err(ProviderError::Directory(message.clone())),
            None => Ok(self.directory()),
        }
    }

    fn generate_keypair(&self) -> Result<Keypair, ProviderError> {
        self.calls.generate_keypair.fetch_add(1, Ordering::SeqCst);
        keys::generate_keypair()
    }

    fn select_region(
        &self,
        directory: &RegionDirectory,
        region: &str,
    ) -> Result<RegionEndpoint, ProviderError> {
        self.calls.select_region.fetch_add(1, Ordering::SeqCst);
        RegionEndpoint::select(directory, region)
    }

    async fn authenticate(
        &self,
        _endpoint: &RegionEndpoint,
        _username: &str,
        _password: &str,
    ) -> Result<AuthToken, ProviderError> {
        self.calls.authenticate.fetch_add(1, Ordering::SeqCst);
        match self.auth {
            AuthOutcome::Accept => Ok(AuthToken::new("stub-token")),
            AuthOutcome::Reject => Err(ProviderError::InvalidCredentials),
            AuthOutcome::Unreachable => {
                Err(ProviderError::Transport("connection refused".to_string()))
            }
        }
    }

    async fn register_key(
        &self,
        _token: &AuthToken,
        endpoint: &RegionEndpoint,
        keypair: &Keypair,
    ) -> Result<ConnectionParameters, ProviderError> {
        self.calls.register_key.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.registration_error {
            return Err(ProviderError::Registration(message.clone()));
        }

        ConnectionParameters::new(
            self.local_address.clone(),
            keypair.private_key.clone(),
            self.dns_servers.clone(),
            self.server_public_key.clone(),
            endpoint.wg.ip.clone(),
        )
    }
}
