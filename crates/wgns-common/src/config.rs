//! Global configuration model for wgns.
//!
//! A single immutable [`WgnsConfig`] is built at startup and handed to every
//! component; nothing in the workspace keeps mutable global settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::{InterfaceName, NamespaceName};

/// Root configuration for wgns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WgnsConfig {
    /// Path to the `ip` executable.
    pub ip_path: PathBuf,
    /// Path (or `PATH` name) of the `wg` executable.
    pub wg_path: PathBuf,
    /// Directory holding `<interface>.conf` documents.
    pub config_dir: PathBuf,
    /// Root of the per-namespace `/etc` overlay used by `ip netns exec`.
    pub netns_etc_dir: PathBuf,
    /// Log raw command output at debug level.
    pub debug: bool,
}

impl Default for WgnsConfig {
    fn default() -> Self {
        Self {
            ip_path: constants::ip_path().clone(),
            wg_path: PathBuf::from(constants::DEFAULT_WG_PATH),
            config_dir: PathBuf::from(constants::DEFAULT_CONFIG_DIR),
            netns_etc_dir: PathBuf::from(constants::DEFAULT_NETNS_ETC_DIR),
            debug: false,
        }
    }
}

impl WgnsConfig {
    /// Returns the path of the tunnel configuration document for `interface`.
    #[must_use]
    pub fn tunnel_config_path(&self, interface: &InterfaceName) -> PathBuf {
        self.config_dir
            .join(interface.as_str())
            .with_extension(constants::CONFIG_EXTENSION)
    }

    /// Returns the resolver file read by processes inside `namespace`.
    #[must_use]
    pub fn resolv_conf_path(&self, namespace: &NamespaceName) -> PathBuf {
        namespace_dir(&self.netns_etc_dir, namespace).join(constants::RESOLV_CONF)
    }
}

fn namespace_dir(root: &Path, namespace: &NamespaceName) -> PathBuf {
    root.join(namespace.as_str())
}
