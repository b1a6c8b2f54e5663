//! Data types exchanged between the provider client and the provisioning workflow

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ProviderError;

/// A single server inside a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNode {
    /// IP address to connect to
    pub ip: String,
    /// TLS common name presented by the server
    pub cn: String,
}

/// A provider point of presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Provider identifier (e.g. `us_east`)
    pub id: String,
    /// Human readable label (e.g. `US East`)
    pub name: String,
    /// Metadata servers, used for token exchange
    pub meta: Vec<ServerNode>,
    /// WireGuard servers, used for key registration
    pub wg: Vec<ServerNode>,
}

/// Region label -> region descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionDirectory {
    regions: BTreeMap<String, Region>,
}

impl RegionDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region keyed by its label, replacing any region with the same label
    pub fn insert(&mut self, region: Region) {
        self.regions.insert(region.name.clone(), region);
    }

    /// Check whether a label is part of the directory
    pub fn contains(&self, label: &str) -> bool {
        self.regions.contains_key(label)
    }

    /// Look up a region by label
    pub fn get(&self, label: &str) -> Option<&Region> {
        self.regions.get(label)
    }

    /// All labels, lexicographically sorted
    pub fn labels(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl FromIterator<Region> for RegionDirectory {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut directory = RegionDirectory::new();
        for region in iter {
            directory.insert(region);
        }
        directory
    }
}

/// The servers of one region selected for a provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEndpoint {
    /// Region label
    pub region: String,
    /// Server used for the token exchange
    pub meta: ServerNode,
    /// Server the key is registered with
    pub wg: ServerNode,
}

impl RegionEndpoint {
    /// Bind a region of `directory` to its first metadata and WireGuard servers
    pub fn select(directory: &RegionDirectory, label: &str) -> Result<Self, ProviderError> {
        let region = directory
            .get(label)
            .ok_or_else(|| ProviderError::UnknownRegion(label.to_string()))?;

        let meta = region
            .meta
            .first()
            .cloned()
            .ok_or_else(|| ProviderError::NoServers {
                region: label.to_string(),
                kind: "meta",
            })?;
        let wg = region
            .wg
            .first()
            .cloned()
            .ok_or_else(|| ProviderError::NoServers {
                region: label.to_string(),
                kind: "wg",
            })?;

        Ok(Self {
            region: label.to_string(),
            meta,
            wg,
        })
    }
}

/// Curve25519 keypair, both halves base64 encoded
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    pub private_key: String,
    pub public_key: String,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Session token returned by the provider's token exchange
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Everything needed to write a tunnel configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Address assigned to the local interface (e.g. `10.6.0.5/32`)
    pub local_address: String,
    /// Base64 private key of the local interface
    pub private_key: String,
    /// DNS servers pushed by the provider, at least two
    dns_servers: Vec<String>,
    /// Base64 public key of the peer
    pub server_public_key: String,
    /// Host (IP) of the peer, without port
    pub server_endpoint_host: String,
}

impl ConnectionParameters {
    /// Build connection parameters, rejecting fewer than two DNS servers
    pub fn new(
        local_address: impl Into<String>,
        private_key: impl Into<String>,
        dns_servers: Vec<String>,
        server_public_key: impl Into<String>,
        server_endpoint_host: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        if dns_servers.len() < 2 {
            return Err(ProviderError::InvalidResponse(format!(
                "expected at least two DNS servers, got {}",
                dns_servers.len()
            )));
        }

        Ok(Self {
            local_address: local_address.into(),
            private_key: private_key.into(),
            dns_servers,
            server_public_key: server_public_key.into(),
            server_endpoint_host: server_endpoint_host.into(),
        })
    }

    /// The first two DNS servers
    pub fn primary_dns(&self) -> (&str, &str) {
        (&self.dns_servers[0], &self.dns_servers[1])
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("local_address", &self.local_address)
            .field("private_key", &"<redacted>")
            .field("dns_servers", &self.dns_servers)
            .field("server_public_key", &self.server_public_key)
            .field("server_endpoint_host", &self.server_endpoint_host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(ip: &str, cn: &str) -> ServerNode {
        ServerNode {
            ip: ip.to_string(),
            cn: cn.to_string(),
        }
    }

    fn region(name: &str, meta: Vec<ServerNode>, wg: Vec<ServerNode>) -> Region {
        Region {
            id: name.to_lowercase().replace(' ', "_"),
            name: name.to_string(),
            meta,
            wg,
        }
    }

    #[test]
    fn test_directory_labels_sorted() {
        let directory: RegionDirectory = vec![
            region("US West", vec![], vec![]),
            region("AU Sydney", vec![], vec![]),
            region("DE Berlin", vec![], vec![]),
        ]
        .into_iter()
        .collect();

        assert_eq!(directory.labels(), vec!["AU Sydney", "DE Berlin", "US West"]);
        assert_eq!(directory.len(), 3);
        assert!(directory.contains("DE Berlin"));
        assert!(!directory.contains("de berlin"));
    }

    #[test]
    fn test_select_picks_first_servers() {
        let directory: RegionDirectory = vec![region(
            "US East",
            vec![node("1.1.1.1", "meta1"), node("1.1.1.2", "meta2")],
            vec![node("2.2.2.1", "wg1"), node("2.2.2.2", "wg2")],
        )]
        .into_iter()
        .collect();

        let endpoint = RegionEndpoint::select(&directory, "US East").unwrap();
        assert_eq!(endpoint.region, "US East");
        assert_eq!(endpoint.meta, node("1.1.1.1", "meta1"));
        assert_eq!(endpoint.wg, node("2.2.2.1", "wg1"));
    }

    #[test]
    fn test_select_unknown_region() {
        let directory = RegionDirectory::new();
        let result = RegionEndpoint::select(&directory, "Atlantis");
        assert_eq!(
            result,
            Err(ProviderError::UnknownRegion("Atlantis".to_string()))
        );
    }

    #[test]
    fn test_select_region_without_wg_server() {
        let directory: RegionDirectory =
            vec![region("CA Toronto", vec![node("1.1.1.1", "meta")], vec![])]
                .into_iter()
                .collect();

        let result = RegionEndpoint::select(&directory, "CA Toronto");
        assert!(matches!(
            result,
            Err(ProviderError::NoServers { kind: "wg", .. })
        ));
    }

    #[test]
    fn test_connection_parameters_require_two_dns_servers() {
        let result = ConnectionParameters::new(
            "10.6.0.5/32",
            "priv",
            vec!["10.0.0.1".to_string()],
            "pub",
            "1.2.3.4",
        );
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let params = ConnectionParameters::new(
            "10.6.0.5/32",
            "super-secret",
            vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            "pub",
            "1.2.3.4",
        )
        .unwrap();
        let keypair = Keypair {
            private_key: "super-secret".to_string(),
            public_key: "pub".to_string(),
        };
        let token = AuthToken::new("super-secret");

        assert!(!format!("{:?}", params).contains("super-secret"));
        assert!(!format!("{:?}", keypair).contains("super-secret"));
        assert!(!format!("{:?}", token).contains("super-secret"));
        assert_eq!(params.primary_dns(), ("10.0.0.1", "10.0.0.2"));
    }
}
