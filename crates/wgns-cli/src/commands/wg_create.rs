//! `wgns wg-create`: create a WireGuard link on the host.

use clap::Args;
use wgns_common::types::InterfaceName;
use wgns_core::NetContext;
use wgns_core::link::LinkProvisioner;

use crate::output;

/// Arguments for the `wg-create` command.
#[derive(Args, Debug)]
pub struct WgCreateArgs {
    /// Interface name.
    pub interface: String,
}

/// Executes the `wg-create` command.
///
/// # Errors
///
/// Returns an error if the name is invalid, taken by another kind of link,
/// or the link cannot be created.
pub fn execute(args: WgCreateArgs, ctx: NetContext<'_>) -> anyhow::Result<()> {
    let iface = InterfaceName::new(args.interface)?;
    let outcome = LinkProvisioner::new(ctx).create_tunnel_link(&iface)?;
    output::step(format_args!("wg-create {iface}"), outcome);
    Ok(())
}
