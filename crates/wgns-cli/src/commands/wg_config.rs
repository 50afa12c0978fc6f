//! `wgns wg-config`: apply a tunnel configuration to a link that is
//! already inside its namespace.

use std::path::PathBuf;

use clap::Args;
use wgns_common::types::{InterfaceName, NamespaceName};
use wgns_core::NetContext;
use wgns_core::applier::ConfigApplier;

use crate::commands::load_tunnel;
use crate::output;

/// Arguments for the `wg-config` command.
#[derive(Args, Debug)]
pub struct WgConfigArgs {
    /// Interface name, already inside the namespace.
    pub interface: String,

    /// Namespace holding the interface.
    pub namespace: String,

    /// Configuration file; defaults to `<config-dir>/<interface>.conf`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Executes the `wg-config` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or any step fails.
pub fn execute(args: WgConfigArgs, ctx: NetContext<'_>) -> anyhow::Result<()> {
    let iface = InterfaceName::new(args.interface)?;
    let namespace = NamespaceName::new(args.namespace)?;
    let tunnel = load_tunnel(ctx.config, &iface, args.config.as_deref())?;

    let report = ConfigApplier::new(ctx).apply(&iface, &namespace, &tunnel)?;
    output::report(&report);
    Ok(())
}
