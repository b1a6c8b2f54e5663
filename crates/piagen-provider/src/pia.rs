//! Live PIA client over HTTPS
//!
//! Token and key registration requests go to a specific server IP while the
//! TLS certificate is verified against the server's common name, so every
//! call builds a client with the name pinned to that address.

use async_trait::async_trait;
use reqwest::{Certificate, Client, StatusCode};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::ProviderClient;
use crate::error::ProviderError;
use crate::types::{
    AuthToken, ConnectionParameters, Keypair, Region, RegionDirectory, RegionEndpoint, ServerNode,
};

/// Public server list endpoint
pub const DEFAULT_SERVERLIST_URL: &str = "https://serverlist.piaservers.net/vpninfo/servers/v6";

/// Port the metadata servers accept token requests on
const META_PORT: u16 = 443;

/// Port the WireGuard servers accept key registrations on
const WG_API_PORT: u16 = 1337;

/// HTTP request timeout (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`PiaClient`]
#[derive(Debug, Clone)]
pub struct PiaClientConfig {
    /// Server list URL
    pub serverlist_url: String,
    /// PEM encoded CA that signs the provider's servers
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for PiaClientConfig {
    fn default() -> Self {
        Self {
            serverlist_url: DEFAULT_SERVERLIST_URL.to_string(),
            ca_cert_pem: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Provider client talking to the real PIA endpoints
#[derive(Clone)]
pub struct PiaClient {
    serverlist_url: String,
    ca_cert: Option<Certificate>,
    timeout: Duration,
}

impl PiaClient {
    /// Create a client, validating the CA certificate up front
    pub fn new(config: PiaClientConfig) -> Result<Self, ProviderError> {
        let ca_cert = match config.ca_cert_pem {
            Some(pem) => Some(Certificate::from_pem(&pem).map_err(|e| {
                ProviderError::Transport(format!("invalid CA certificate: {}", e))
            })?),
            None => None,
        };

        Ok(Self {
            serverlist_url: config.serverlist_url,
            ca_cert,
            timeout: config.timeout,
        })
    }

    fn client(&self) -> Result<Client, ProviderError> {
        Ok(Client::builder().timeout(self.timeout).build()?)
    }

    /// Client that resolves `host` to `addr` and trusts the provider CA
    fn pinned_client(&self, host: &str, addr: SocketAddr) -> Result<Client, ProviderError> {
        let mut builder = Client::builder().timeout(self.timeout).resolve(host, addr);
        if let Some(cert) = &self.ca_cert {
            builder = builder.add_root_certificate(cert.clone());
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl ProviderClient for PiaClient {
    async fn list_regions(&self) -> Result<RegionDirectory, ProviderError> {
        debug!("Fetching server list from {}", self.serverlist_url);

        let response = self
            .client()
            .map_err(|e| ProviderError::Directory(e.to_string()))?
            .get(&self.serverlist_url)
            .send()
            .await
            .map_err(|e| ProviderError::Directory(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Directory(format!(
                "server list returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Directory(e.to_string()))?;

        let directory = parse_server_list(&body)?;
        info!("Loaded {} regions from server list", directory.len());
        Ok(directory)
    }

    async fn authenticate(
        &self,
        endpoint: &RegionEndpoint,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, ProviderError> {
        let meta = &endpoint.meta;
        let addr = socket_addr(meta, META_PORT)?;
        let url = format!("https://{}/authv3/generateToken", meta.cn);
        debug!("Requesting token from {} ({})", meta.cn, addr);

        let response = self
            .pinned_client(&meta.cn, addr)?
            .get(&url)
            .basic_auth(username, Some(password))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_token_response(status, &body)
    }

    async fn register_key(
        &self,
        token: &AuthToken,
        endpoint: &RegionEndpoint,
        keypair: &Keypair,
    ) -> Result<ConnectionParameters, ProviderError> {
        let wg = &endpoint.wg;
        let addr = socket_addr(wg, WG_API_PORT)?;
        let url = format!("https://{}:{}/addKey", wg.cn, WG_API_PORT);
        debug!("Registering public key with {} ({})", wg.cn, addr);

        let response = self
            .pinned_client(&wg.cn, addr)?
            .get(&url)
            .query(&[("pt", token.as_str()), ("pubkey", keypair.public_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Registration(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Registration(e.to_string()))?;
        parse_add_key_response(status, &body, keypair)
    }
}

fn socket_addr(node: &ServerNode, port: u16) -> Result<SocketAddr, ProviderError> {
    let ip: IpAddr = node.ip.parse().map_err(|_| {
        ProviderError::InvalidResponse(format!("invalid server IP '{}' for {}", node.ip, node.cn))
    })?;
    Ok(SocketAddr::new(ip, port))
}

#[derive(Debug, Deserialize)]
struct ServerList {
    regions: Vec<ServerListRegion>,
}

#[derive(Debug, Deserialize)]
struct ServerListRegion {
    id: String,
    name: String,
    #[serde(default)]
    servers: ServerListServers,
}

#[derive(Debug, Default, Deserialize)]
struct ServerListServers {
    #[serde(default)]
    meta: Vec<ServerNode>,
    #[serde(default)]
    wg: Vec<ServerNode>,
}

/// Parse the server list body
///
/// Only the first line is JSON; the provider appends a signature after it.
pub fn parse_server_list(body: &str) -> Result<RegionDirectory, ProviderError> {
    let first_line = body.lines().next().unwrap_or_default();
    let list: ServerList = serde_json::from_str(first_line)
        .map_err(|e| ProviderError::Directory(format!("failed to parse server list: {}", e)))?;

    let directory: RegionDirectory = list
        .regions
        .into_iter()
        .map(|r| Region {
            id: r.id,
            name: r.name,
            meta: r.servers.meta,
            wg: r.servers.wg,
        })
        .collect();

    if directory.is_empty() {
        return Err(ProviderError::Directory(
            "server list contains no regions".to_string(),
        ));
    }
    Ok(directory)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    status: String,
    #[serde(default)]
    token: Option<String>,
}

fn parse_token_response(status: StatusCode, body: &str) -> Result<AuthToken, ProviderError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!("Token request rejected with HTTP {}", status);
        return Err(ProviderError::InvalidCredentials);
    }
    if !status.is_success() {
        warn!("Token request failed with HTTP {}", status);
        return Err(ProviderError::InvalidResponse(format!(
            "token request returned HTTP {}",
            status
        )));
    }

    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Transport(format!("invalid token response: {}", e)))?;

    match response.token {
        Some(token) if response.status == "OK" && !token.is_empty() => Ok(AuthToken::new(token)),
        _ => Err(ProviderError::InvalidCredentials),
    }
}

#[derive(Debug, Deserialize)]
struct AddKeyResponse {
    status: String,
    #[serde(default)]
    server_key: Option<String>,
    #[serde(default)]
    server_ip: Option<String>,
    #[serde(default)]
    peer_ip: Option<String>,
    #[serde(default)]
    dns_servers: Vec<String>,
}

fn parse_add_key_response(
    status: StatusCode,
    body: &str,
    keypair: &Keypair,
) -> Result<ConnectionParameters, ProviderError> {
    if status != StatusCode::OK {
        return Err(ProviderError::Registration(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    let response: AddKeyResponse =
        serde_json::from_str(body).map_err(|_| ProviderError::Registration(body.to_string()))?;
    if response.status != "OK" {
        return Err(ProviderError::Registration(body.to_string()));
    }

    let (Some(peer_ip), Some(server_key), Some(server_ip)) =
        (response.peer_ip, response.server_key, response.server_ip)
    else {
        return Err(ProviderError::Registration(format!(
            "incomplete registration response: {}",
            body
        )));
    };

    ConnectionParameters::new(
        peer_ip,
        keypair.private_key.clone(),
        response.dns_servers,
        server_key,
        server_ip,
    )
    .map_err(|e| ProviderError::Registration(e.to_string()))
}
