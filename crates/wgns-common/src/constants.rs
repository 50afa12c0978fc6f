//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Fallback location of the `ip` executable.
pub const DEFAULT_IP_PATH: &str = "/bin/ip";

/// Default `wg` executable, resolved through `PATH` inside the namespace.
pub const DEFAULT_WG_PATH: &str = "wg";

/// Directory holding `<interface>.conf` tunnel configuration documents.
pub const DEFAULT_CONFIG_DIR: &str = "/etc/wireguard";

/// Directory under which `ip netns exec` bind-mounts per-namespace files.
pub const DEFAULT_NETNS_ETC_DIR: &str = "/etc/netns";

/// File name of the per-namespace resolver configuration.
pub const RESOLV_CONF: &str = "resolv.conf";

/// Extension of tunnel configuration documents.
pub const CONFIG_EXTENSION: &str = "conf";

/// Kernel limit on network namespace names used by this tool.
pub const MAX_NAMESPACE_NAME_LEN: usize = 15;

/// Link type passed to `ip link add`.
pub const TUNNEL_LINK_KIND: &str = "wireguard";

/// Path MTU assumed when no route can be probed.
pub const FALLBACK_MTU: u32 = 1500;

/// Encapsulation overhead subtracted from the path MTU (IPv6 outer header,
/// UDP, and WireGuard framing).
pub const TUNNEL_OVERHEAD: u32 = 80;

/// Application name used in CLI output.
pub const APP_NAME: &str = "wgns";

fn resolve_ip_path() -> PathBuf {
    which::which("ip").unwrap_or_else(|_| PathBuf::from(DEFAULT_IP_PATH))
}

static IP_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the `ip` executable for this session, looked up on `PATH` once
/// and falling back to [`DEFAULT_IP_PATH`].
pub fn ip_path() -> &'static PathBuf {
    IP_PATH.get_or_init(resolve_ip_path)
}
