//! `wgns up`: create the namespace and link, then apply the configuration.

use std::path::PathBuf;

use clap::Args;
use wgns_common::types::{InterfaceName, NamespaceName};
use wgns_core::NetContext;
use wgns_core::orchestrator::Orchestrator;

use crate::commands::load_tunnel;
use crate::output;

/// Arguments for the `up` command.
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Interface name.
    pub interface: String,

    /// Namespace to create (or reuse) for the interface.
    pub namespace: String,

    /// Configuration file; defaults to `<config-dir>/<interface>.conf`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Executes the `up` command.
///
/// The configuration is loaded before anything is changed, so a missing or
/// malformed file leaves the host untouched.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or a step fails;
/// the error names the failed step.
pub fn execute(args: UpArgs, ctx: NetContext<'_>) -> anyhow::Result<()> {
    let iface = InterfaceName::new(args.interface)?;
    let namespace = NamespaceName::new(args.namespace)?;
    let tunnel = load_tunnel(ctx.config, &iface, args.config.as_deref())?;

    let report = Orchestrator::new(ctx).provision(&iface, &namespace, &tunnel)?;
    output::report(&report);
    Ok(())
}
