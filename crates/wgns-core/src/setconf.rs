//! Rendering of the text `wg setconf` reads.
//!
//! Only keys understood by `wg` itself are emitted; addresses, DNS and MTU
//! are applied separately through `ip`.

use std::fmt::Write as _;

use wgns_config::TunnelConfig;

/// Renders `config` as `wg setconf` input.
///
/// The result contains the private key and must only ever be written to the
/// tool's standard input.
#[must_use]
pub fn render(config: &TunnelConfig) -> String {
    let mut out = String::new();
    let iface = &config.interface;
    let _ = writeln!(out, "[Interface]");
    let _ = writeln!(out, "PrivateKey = {}", iface.private_key.expose());
    if let Some(port) = iface.listen_port {
        let _ = writeln!(out, "ListenPort = {port}");
    }
    out.push('\n');

    for peer in &config.peers {
        let _ = writeln!(out, "[Peer]");
        let _ = writeln!(out, "PublicKey = {}", peer.public_key);
        if let Some(psk) = &peer.preshared_key {
            let _ = writeln!(out, "PresharedKey = {}", psk.expose());
        }
        let _ = writeln!(out, "Endpoint = {}", peer.endpoint);
        if !peer.allowed_ips.is_empty() {
            let ranges: Vec<String> = peer.allowed_ips.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "AllowedIPs = {}", ranges.join(", "));
        }
        if let Some(interval) = peer.persistent_keepalive {
            let _ = writeln!(out, "PersistentKeepalive = {interval}");
        }
        out.push('\n');
    }
    out
}
