//! CLI command definitions and dispatch.

pub mod move_if;
pub mod ns_create;
pub mod ns_dns;
pub mod show_config;
pub mod up;
pub mod wg_config;
pub mod wg_create;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use wgns_common::config::WgnsConfig;
use wgns_common::constants;
use wgns_common::types::InterfaceName;
use wgns_config::TunnelConfig;
use wgns_core::NetContext;
use wgns_core::gateway::IpGateway;

/// wgns: WireGuard links inside network namespaces.
#[derive(Parser, Debug)]
#[command(name = constants::APP_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the `ip` executable.
    #[arg(long, global = true, env = "WGNS_IP_PATH")]
    pub ip_path: Option<PathBuf>,

    /// Path to the `wg` executable.
    #[arg(long, global = true, env = "WGNS_WG_PATH")]
    pub wg_path: Option<PathBuf>,

    /// Directory holding `<interface>.conf` files.
    #[arg(long, global = true, env = "WGNS_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Root of the per-namespace `/etc` overlay.
    #[arg(long, global = true, env = "WGNS_NETNS_DIR")]
    pub netns_dir: Option<PathBuf>,

    /// Log every command and its raw output.
    #[arg(long, global = true)]
    pub debug: bool,
}

impl Cli {
    /// Builds the run configuration from defaults and flags.
    pub fn settings(&self) -> WgnsConfig {
        let defaults = WgnsConfig::default();
        WgnsConfig {
            ip_path: self.ip_path.clone().unwrap_or(defaults.ip_path),
            wg_path: self.wg_path.clone().unwrap_or(defaults.wg_path),
            config_dir: self.config_dir.clone().unwrap_or(defaults.config_dir),
            netns_etc_dir: self.netns_dir.clone().unwrap_or(defaults.netns_etc_dir),
            debug: self.debug,
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a network namespace.
    NsCreate(ns_create::NsCreateArgs),
    /// Write the resolver file of a namespace.
    NsDns(ns_dns::NsDnsArgs),
    /// Create a WireGuard link on the host.
    WgCreate(wg_create::WgCreateArgs),
    /// Move a host link into a namespace.
    MoveIfToNs(move_if::MoveIfArgs),
    /// Apply a tunnel configuration to a link inside a namespace.
    WgConfig(wg_config::WgConfigArgs),
    /// Create everything and bring the tunnel up.
    #[command(alias = "wgquick-up-in-ns")]
    Up(up::UpArgs),
    /// Print a tunnel configuration with secrets redacted.
    ShowConfig(show_config::ShowConfigArgs),
}

impl Command {
    /// Returns `true` for subcommands that need root privileges.
    pub const fn changes_kernel_state(&self) -> bool {
        !matches!(self, Self::ShowConfig(_))
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings();
    tracing::debug!(?settings, "resolved settings");

    if cli.command.changes_kernel_state() {
        warn_unless_root();
    }
    let gateway = IpGateway::new(&settings);
    let ctx = NetContext::new(&gateway, &settings);

    match cli.command {
        Command::NsCreate(args) => ns_create::execute(args, ctx),
        Command::NsDns(args) => ns_dns::execute(args, ctx),
        Command::WgCreate(args) => wg_create::execute(args, ctx),
        Command::MoveIfToNs(args) => move_if::execute(args, ctx),
        Command::WgConfig(args) => wg_config::execute(args, ctx),
        Command::Up(args) => up::execute(args, ctx),
        Command::ShowConfig(args) => show_config::execute(args, &settings),
    }
}

/// Loads the configuration for `iface` from `explicit` or the config
/// directory.
pub(crate) fn load_tunnel(
    settings: &WgnsConfig,
    iface: &InterfaceName,
    explicit: Option<&Path>,
) -> anyhow::Result<TunnelConfig> {
    let path = explicit.map_or_else(|| settings.tunnel_config_path(iface), Path::to_path_buf);
    Ok(wgns_config::loader::load(&path)?)
}

fn warn_unless_root() {
    if !nix::unistd::Uid::effective().is_root() {
        tracing::warn!("not running as root; namespace and link changes will likely be refused");
    }
}
