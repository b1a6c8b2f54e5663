//! WireGuard configuration rendering

use piagen_provider::ConnectionParameters;

/// Port the provider's WireGuard servers listen on
pub const WIREGUARD_PORT: u16 = 1337;

/// Keepalive interval written into every peer block, in seconds
pub const PERSISTENT_KEEPALIVE_SECS: u32 = 25;

/// Render the tunnel configuration for `params`
///
/// The output is fully determined by its inputs. `tunnel_name` ends up as a
/// comment so that Unraid can label the tunnel.
pub fn render(params: &ConnectionParameters, tunnel_name: &str) -> String {
    let (dns1, dns2) = params.primary_dns();

    format!(
        "[Interface]
Address = {address}
PrivateKey = {private_key}
DNS = {dns1},{dns2}

# Uncomment the below two PostUp and PreDown routing rules if routing containers through WireGuard container
# PostUp = iptables -t nat -A POSTROUTING -o wg+ -j MASQUERADE
# PreDown = iptables -t nat -D POSTROUTING -o wg+ -j MASQUERADE

# Unraid note: leave the next line commented. Used only for naming the tunnel in Unraid
# {tunnel_name}

[Peer]
PublicKey = {server_key}
Endpoint = {host}:{port}
AllowedIPs = 0.0.0.0/0
PersistentKeepalive = {keepalive}
",
        address = params.local_address,
        private_key = params.private_key,
        server_key = params.server_public_key,
        host = params.server_endpoint_host,
        port = WIREGUARD_PORT,
        keepalive = PERSISTENT_KEEPALIVE_SECS,
    )
}
