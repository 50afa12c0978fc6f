//! Locating and reading tunnel configuration documents from disk.

use std::path::Path;

use wgns_common::error::{Result, WgnsError};

use crate::model::TunnelConfig;
use crate::parser::parse_tunnel_config;

/// Permission bits that let anyone but the owner read the private key.
const FOREIGN_ACCESS_BITS: u32 = 0o077;

/// Loads and validates the tunnel configuration document at `path`.
///
/// A missing document is reported as [`WgnsError::NotFound`] with kind
/// `tunnel configuration`, distinct from a document that fails to parse.
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, or if its content
/// fails parsing or validation.
pub fn load(path: &Path) -> Result<TunnelConfig> {
    tracing::info!(path = %path.display(), "loading tunnel configuration");
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WgnsError::NotFound {
                kind: "tunnel configuration",
                id: path.display().to_string(),
            }
        } else {
            WgnsError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    warn_if_exposed(path);
    parse_tunnel_config(&content).map_err(|e| match e {
        WgnsError::InvalidInput { message } => WgnsError::InvalidInput {
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })
}

#[cfg(unix)]
fn warn_if_exposed(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode();
        if is_exposed_mode(mode) {
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "configuration file is accessible by other users"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_exposed(_path: &Path) {}

/// Returns `true` if `mode` grants group or other users any access.
#[must_use]
pub const fn is_exposed_mode(mode: u32) -> bool {
    mode & FOREIGN_ACCESS_BITS != 0
}
