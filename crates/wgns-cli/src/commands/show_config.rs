//! `wgns show-config`: print a parsed configuration as JSON.

use std::path::PathBuf;

use clap::Args;
use wgns_common::config::WgnsConfig;
use wgns_common::types::InterfaceName;

use crate::commands::load_tunnel;

/// Arguments for the `show-config` command.
#[derive(Args, Debug)]
pub struct ShowConfigArgs {
    /// Interface whose configuration to show.
    pub interface: String,

    /// Configuration file; defaults to `<config-dir>/<interface>.conf`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Executes the `show-config` command.
///
/// Keys are printed as `<redacted>`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn execute(args: ShowConfigArgs, settings: &WgnsConfig) -> anyhow::Result<()> {
    let iface = InterfaceName::new(args.interface)?;
    let tunnel = load_tunnel(settings, &iface, args.config.as_deref())?;
    let json = tunnel.to_redacted_json()?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
