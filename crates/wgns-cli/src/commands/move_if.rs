//! `wgns move-if-to-ns`: move a host link into a namespace.

use clap::Args;
use wgns_common::types::{InterfaceName, NamespaceName};
use wgns_core::NetContext;
use wgns_core::link::LinkProvisioner;

use crate::output;

/// Arguments for the `move-if-to-ns` command.
#[derive(Args, Debug)]
pub struct MoveIfArgs {
    /// Interface name, currently on the host.
    pub interface: String,

    /// Target namespace.
    pub namespace: String,
}

/// Executes the `move-if-to-ns` command.
///
/// # Errors
///
/// Returns an error if either name is invalid, the link is not on the host,
/// or the namespace does not exist.
pub fn execute(args: MoveIfArgs, ctx: NetContext<'_>) -> anyhow::Result<()> {
    let iface = InterfaceName::new(args.interface)?;
    let namespace = NamespaceName::new(args.namespace)?;
    let outcome = LinkProvisioner::new(ctx).move_to_namespace(&iface, &namespace)?;
    output::step(format_args!("move-if-to-ns {iface} -> {namespace}"), outcome);
    Ok(())
}
