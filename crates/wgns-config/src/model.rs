//! Typed representation of a tunnel configuration document.

use std::fmt;
use std::net::IpAddr;

use serde::{Serialize, Serializer};
use wgns_common::error::Result;
use wgns_common::types::{Cidr, Endpoint};

/// A base64 key that must never appear in logs or command lines.
///
/// `Debug` and `Serialize` print a placeholder; use [`SecretKey::expose`]
/// where the key is actually needed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps a key string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key material.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("<redacted>")
    }
}

/// A parsed tunnel configuration: one interface and its ordered peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelConfig {
    /// The `[Interface]` section.
    pub interface: InterfaceSettings,
    /// The `[Peer]` sections, in document order.
    pub peers: Vec<PeerSettings>,
}

/// Settings of the local tunnel interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceSettings {
    /// Interface private key.
    pub private_key: SecretKey,
    /// UDP listen port; random when absent.
    pub listen_port: Option<u16>,
    /// Addresses assigned to the interface.
    pub addresses: Vec<Cidr>,
    /// Explicit MTU override.
    pub mtu: Option<u32>,
    /// Resolver configuration for the namespace.
    pub dns: Option<DnsSettings>,
}

/// Resolvers and search domain from the `DNS` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsSettings {
    /// Resolver addresses, in order. Never empty.
    pub resolvers: Vec<IpAddr>,
    /// Search domain(s), space separated.
    pub search: Option<String>,
}

/// Settings of one remote peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerSettings {
    /// Peer public key; identifies the peer.
    pub public_key: String,
    /// Optional symmetric key mixed into the handshake.
    pub preshared_key: Option<SecretKey>,
    /// Where the peer is reached.
    pub endpoint: Endpoint,
    /// Ranges routed to and accepted from this peer.
    pub allowed_ips: Vec<Cidr>,
    /// Keepalive interval in seconds.
    pub persistent_keepalive: Option<u16>,
}

impl TunnelConfig {
    /// Returns the peer with the given public key.
    #[must_use]
    pub fn peer(&self, public_key: &str) -> Option<&PeerSettings> {
        self.peers.iter().find(|p| p.public_key == public_key)
    }

    /// Renders the configuration as pretty JSON with keys redacted.
    ///
    /// # Errors
    ///
    /// Returns [`wgns_common::error::WgnsError::Serialization`] if encoding
    /// fails.
    pub fn to_redacted_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
