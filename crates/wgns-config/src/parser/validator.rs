//! Semantic validation of an assembled document.
//!
//! Checks required keys, key encoding, and peer uniqueness, and turns the
//! drafts into the typed model.

use std::collections::HashSet;

use wgns_common::error::{Result, WgnsError};

use super::{DocumentDraft, InterfaceDraft, PeerDraft};
use crate::model::{InterfaceSettings, PeerSettings, SecretKey, TunnelConfig};

/// Length of a base64-encoded 32-byte key.
const KEY_BASE64_LEN: usize = 44;

/// Validates a document draft and builds the tunnel configuration.
///
/// # Checks performed
///
/// 1. Exactly one `[Interface]` section, with a `PrivateKey`.
/// 2. Every `[Peer]` has a `PublicKey` and an `Endpoint`.
/// 3. No two peers share a public key.
/// 4. Every key is 44 characters of base64 ending in `=`.
///
/// # Errors
///
/// Returns [`WgnsError::InvalidInput`] describing the first failed check.
pub fn validate(doc: DocumentDraft) -> Result<TunnelConfig> {
    let DocumentDraft {
        mut interfaces,
        peers,
    } = doc;
    if interfaces.len() > 1 {
        return Err(WgnsError::invalid(format!(
            "line {}: duplicate [Interface] section",
            interfaces[1].line
        )));
    }
    let interface = interfaces
        .pop()
        .ok_or_else(|| WgnsError::invalid("missing [Interface] section"))?;
    let interface = check_interface(interface)?;

    let mut seen = HashSet::new();
    let mut checked = Vec::with_capacity(peers.len());
    for peer in peers {
        let peer = check_peer(peer)?;
        if !seen.insert(peer.public_key.clone()) {
            return Err(WgnsError::invalid(format!(
                "duplicate peer public key: {}",
                peer.public_key
            )));
        }
        checked.push(peer);
    }

    Ok(TunnelConfig {
        interface,
        peers: checked,
    })
}

fn check_interface(draft: InterfaceDraft) -> Result<InterfaceSettings> {
    let private_key = draft.private_key.ok_or_else(|| {
        WgnsError::invalid(format!(
            "line {}: [Interface] has no PrivateKey",
            draft.line
        ))
    })?;
    check_key_encoding(&private_key, "PrivateKey", draft.line)?;
    if draft.mtu == Some(0) {
        return Err(WgnsError::invalid(format!(
            "line {}: MTU must be positive",
            draft.line
        )));
    }
    Ok(InterfaceSettings {
        private_key: SecretKey::new(private_key),
        listen_port: draft.listen_port,
        addresses: draft.addresses,
        mtu: draft.mtu,
        dns: draft.dns,
    })
}

fn check_peer(draft: PeerDraft) -> Result<PeerSettings> {
    let line = draft.line;
    let public_key = draft
        .public_key
        .ok_or_else(|| WgnsError::invalid(format!("line {line}: [Peer] has no PublicKey")))?;
    check_key_encoding(&public_key, "PublicKey", line)?;
    if let Some(psk) = &draft.preshared_key {
        check_key_encoding(psk, "PresharedKey", line)?;
    }
    let endpoint = draft.endpoint.ok_or_else(|| {
        WgnsError::invalid(format!(
            "line {line}: [Peer] {public_key} has no Endpoint"
        ))
    })?;
    Ok(PeerSettings {
        public_key,
        preshared_key: draft.preshared_key.map(SecretKey::new),
        endpoint,
        allowed_ips: draft.allowed_ips,
        persistent_keepalive: draft.persistent_keepalive,
    })
}

fn check_key_encoding(key: &str, name: &str, line: usize) -> Result<()> {
    let well_formed = key.len() == KEY_BASE64_LEN
        && key.ends_with('=')
        && key.as_bytes()[..KEY_BASE64_LEN - 1]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/');
    if well_formed {
        Ok(())
    } else {
        Err(WgnsError::invalid(format!(
            "line {line}: {name} is not a base64-encoded 32-byte key"
        )))
    }
}
