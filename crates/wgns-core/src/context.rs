//! Shared, immutable inputs handed to every component.

use wgns_common::config::WgnsConfig;

use crate::gateway::CommandGateway;

/// The gateway and settings a provisioning run works with.
///
/// Cheap to copy; components take it by value.
#[derive(Clone, Copy)]
pub struct NetContext<'a> {
    /// Executes `ip` commands.
    pub gateway: &'a dyn CommandGateway,
    /// Paths and flags for this run.
    pub config: &'a WgnsConfig,
}

impl<'a> NetContext<'a> {
    /// Bundles a gateway with its settings.
    #[must_use]
    pub const fn new(gateway: &'a dyn CommandGateway, config: &'a WgnsConfig) -> Self {
        Self { gateway, config }
    }
}
