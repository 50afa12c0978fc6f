//! `wgns ns-dns`: write the resolver file of a namespace.

use std::net::IpAddr;

use clap::Args;
use wgns_common::types::NamespaceName;
use wgns_core::NetContext;
use wgns_core::namespace::NamespaceManager;

use crate::output;

/// Arguments for the `ns-dns` command.
#[derive(Args, Debug)]
pub struct NsDnsArgs {
    /// Namespace name.
    pub namespace: String,

    /// Resolver addresses, in order of preference.
    #[arg(required = true)]
    pub resolvers: Vec<IpAddr>,

    /// Search domain.
    #[arg(long)]
    pub search: Option<String>,
}

/// Executes the `ns-dns` command.
///
/// # Errors
///
/// Returns an error if the name is invalid or the file cannot be written.
pub fn execute(args: NsDnsArgs, ctx: NetContext<'_>) -> anyhow::Result<()> {
    let namespace = NamespaceName::new(args.namespace)?;
    let outcome =
        NamespaceManager::new(ctx).set_dns(&namespace, &args.resolvers, args.search.as_deref())?;
    output::step(format_args!("ns-dns {namespace}"), outcome);
    Ok(())
}
