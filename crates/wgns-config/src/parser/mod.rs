//! Tunnel configuration parser built on `nom`.
//!
//! Transforms raw document text into a validated [`TunnelConfig`] through
//! lexing, section assembly, and semantic validation phases.

pub mod lexer;
pub mod validator;

use std::net::IpAddr;
use std::str::FromStr;

use wgns_common::error::{Result, WgnsError};
use wgns_common::types::{Cidr, Endpoint};

use self::lexer::{Line, Spanned};
use crate::model::{DnsSettings, TunnelConfig};

/// wg-quick directives that only make sense to wg-quick itself.
const WG_QUICK_ONLY_KEYS: &[&str] = &[
    "table",
    "preup",
    "postup",
    "predown",
    "postdown",
    "saveconfig",
    "fwmark",
];

/// `[Interface]` values as collected, before required-field checks.
#[derive(Debug, Default)]
pub struct InterfaceDraft {
    /// Line of the section header.
    pub line: usize,
    /// `PrivateKey`.
    pub private_key: Option<String>,
    /// `ListenPort`.
    pub listen_port: Option<u16>,
    /// `Address`, accumulated across repeated entries.
    pub addresses: Vec<Cidr>,
    /// `MTU`.
    pub mtu: Option<u32>,
    /// `DNS`, accumulated across repeated entries.
    pub dns: Option<DnsSettings>,
}

/// `[Peer]` values as collected, before required-field checks.
#[derive(Debug, Default)]
pub struct PeerDraft {
    /// Line of the section header.
    pub line: usize,
    /// `PublicKey`.
    pub public_key: Option<String>,
    /// `PresharedKey`.
    pub preshared_key: Option<String>,
    /// `Endpoint`.
    pub endpoint: Option<Endpoint>,
    /// `AllowedIPs`, accumulated across repeated entries.
    pub allowed_ips: Vec<Cidr>,
    /// `PersistentKeepalive`; `off` leaves it unset.
    pub persistent_keepalive: Option<u16>,
}

/// Every section of a document, in order.
#[derive(Debug, Default)]
pub struct DocumentDraft {
    /// All `[Interface]` sections; validation requires exactly one.
    pub interfaces: Vec<InterfaceDraft>,
    /// All `[Peer]` sections.
    pub peers: Vec<PeerDraft>,
}

enum Section {
    Interface,
    Peer,
}

/// Parses a tunnel configuration document from its text.
///
/// # Errors
///
/// Returns [`WgnsError::InvalidInput`] if the text has syntax errors, a value
/// cannot be converted, or the document fails validation.
pub fn parse_tunnel_config(input: &str) -> Result<TunnelConfig> {
    tracing::debug!("parsing tunnel configuration");
    let lines = lexer::tokenize(input)?;
    let draft = assemble(&lines)?;
    validator::validate(draft)
}

fn assemble(lines: &[Spanned]) -> Result<DocumentDraft> {
    let mut doc = DocumentDraft::default();
    let mut current: Option<Section> = None;

    for spanned in lines {
        match &spanned.item {
            Line::Section(name) if name.eq_ignore_ascii_case("interface") => {
                doc.interfaces.push(InterfaceDraft {
                    line: spanned.line,
                    ..InterfaceDraft::default()
                });
                current = Some(Section::Interface);
            }
            Line::Section(name) if name.eq_ignore_ascii_case("peer") => {
                doc.peers.push(PeerDraft {
                    line: spanned.line,
                    ..PeerDraft::default()
                });
                current = Some(Section::Peer);
            }
            Line::Section(name) => {
                return Err(line_err(spanned.line, format!("unknown section [{name}]")));
            }
            Line::Entry { key, value } => {
                let key = key.to_ascii_lowercase();
                match (&current, doc.interfaces.last_mut(), doc.peers.last_mut()) {
                    (Some(Section::Interface), Some(iface), _) => {
                        interface_entry(iface, &key, value, spanned.line)?;
                    }
                    (Some(Section::Peer), _, Some(peer)) => {
                        peer_entry(peer, &key, value, spanned.line)?;
                    }
                    _ => {
                        return Err(line_err(
                            spanned.line,
                            format!("entry {key:?} appears before any section"),
                        ));
                    }
                }
            }
        }
    }
    Ok(doc)
}

fn interface_entry(iface: &mut InterfaceDraft, key: &str, value: &str, line: usize) -> Result<()> {
    match key {
        "privatekey" => iface.private_key = Some(value.to_string()),
        "listenport" => iface.listen_port = Some(number(value, "ListenPort", line)?),
        "address" => iface.addresses.extend(list(value, line)?),
        "mtu" => iface.mtu = Some(number(value, "MTU", line)?),
        "dns" => {
            let parsed = dns(value, line)?;
            iface.dns = Some(match iface.dns.take() {
                Some(mut existing) => {
                    existing.resolvers.extend(parsed.resolvers);
                    existing.search = match (existing.search, parsed.search) {
                        (Some(a), Some(b)) => Some(format!("{a} {b}")),
                        (a, b) => a.or(b),
                    };
                    existing
                }
                None => parsed,
            });
        }
        other => ignore_key(other, line),
    }
    Ok(())
}

fn peer_entry(peer: &mut PeerDraft, key: &str, value: &str, line: usize) -> Result<()> {
    match key {
        "publickey" => peer.public_key = Some(value.to_string()),
        "presharedkey" => peer.preshared_key = Some(value.to_string()),
        "endpoint" => {
            peer.endpoint = Some(value.parse().map_err(|e| line_err(line, format!("{e}")))?);
        }
        "allowedips" => peer.allowed_ips.extend(list(value, line)?),
        "persistentkeepalive" => {
            peer.persistent_keepalive = if value.eq_ignore_ascii_case("off") {
                None
            } else {
                Some(number(value, "PersistentKeepalive", line)?)
            };
        }
        other => ignore_key(other, line),
    }
    Ok(())
}

fn ignore_key(key: &str, line: usize) {
    if WG_QUICK_ONLY_KEYS.contains(&key) {
        tracing::warn!(key, line, "ignoring wg-quick directive");
    } else {
        tracing::warn!(key, line, "ignoring unknown configuration key");
    }
}

fn number<T: FromStr>(value: &str, name: &str, line: usize) -> Result<T> {
    value
        .parse()
        .map_err(|_| line_err(line, format!("{name} is not a valid number: {value:?}")))
}

fn list(value: &str, line: usize) -> Result<Vec<Cidr>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().map_err(|e| line_err(line, format!("{e}"))))
        .collect()
}

fn dns(value: &str, line: usize) -> Result<DnsSettings> {
    let mut resolvers = Vec::new();
    let mut search = Vec::new();
    for item in value.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        match item.parse::<IpAddr>() {
            Ok(addr) => resolvers.push(addr),
            Err(_) => search.push(item),
        }
    }
    if resolvers.is_empty() {
        return Err(line_err(line, "DNS directive has no resolver address".into()));
    }
    Ok(DnsSettings {
        resolvers,
        search: (!search.is_empty()).then(|| search.join(" ")),
    })
}

fn line_err(line: usize, message: String) -> WgnsError {
    WgnsError::invalid(format!("line {line}: {message}"))
}
