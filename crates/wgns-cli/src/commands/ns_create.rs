//! `wgns ns-create`: create a network namespace.

use clap::Args;
use wgns_common::types::NamespaceName;
use wgns_core::NetContext;
use wgns_core::namespace::NamespaceManager;

use crate::output;

/// Arguments for the `ns-create` command.
#[derive(Args, Debug)]
pub struct NsCreateArgs {
    /// Namespace name (alphanumeric, at most 15 characters).
    pub namespace: String,
}

/// Executes the `ns-create` command.
///
/// # Errors
///
/// Returns an error if the name is invalid or the namespace cannot be
/// created.
pub fn execute(args: NsCreateArgs, ctx: NetContext<'_>) -> anyhow::Result<()> {
    let namespace = NamespaceName::new(args.namespace)?;
    let outcome = NamespaceManager::new(ctx).create(&namespace)?;
    output::step(format_args!("ns-create {namespace}"), outcome);
    Ok(())
}
