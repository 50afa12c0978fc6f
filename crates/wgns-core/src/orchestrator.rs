//! The complete provisioning workflow.
//!
//! 1. Create the namespace.
//! 2. Unless the link is already inside it, create the link on the host and
//!    move it in.
//! 3. Apply the tunnel configuration.
//!
//! Whether step 2 is needed is decided by probing the namespace on every
//! run, so a host left half-provisioned by an earlier failure converges on
//! the next attempt. Nothing is rolled back on failure.

use wgns_common::types::{InterfaceName, NamespaceName};
use wgns_config::TunnelConfig;

use crate::applier::ConfigApplier;
use crate::context::NetContext;
use crate::link::LinkProvisioner;
use crate::namespace::NamespaceManager;
use crate::outcome::{InStep, ProvisionError, ProvisionReport, ProvisionStep, StepOutcome};

/// Runs the create, move, and configure workflow.
#[derive(Clone, Copy)]
pub struct Orchestrator<'a> {
    ctx: NetContext<'a>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator working through `ctx`.
    #[must_use]
    pub const fn new(ctx: NetContext<'a>) -> Self {
        Self { ctx }
    }

    /// Provisions `iface` inside `namespace` according to `config`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal failure, tagged with the step that produced
    /// it. Steps completed before the failure are left in place.
    pub fn provision(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        config: &TunnelConfig,
    ) -> Result<ProvisionReport, ProvisionError> {
        tracing::info!(interface = %iface, %namespace, peers = config.peers.len(), "provisioning tunnel");
        let mut report = ProvisionReport::default();

        let step = ProvisionStep::CreateNamespace;
        let outcome = NamespaceManager::new(self.ctx).create(namespace).in_step(step)?;
        report.record(step, outcome);

        self.ensure_link(iface, namespace, &mut report)?;

        ConfigApplier::new(self.ctx).apply_into(iface, namespace, config, &mut report)?;

        tracing::info!(
            interface = %iface,
            %namespace,
            changed = !report.is_noop(),
            "tunnel provisioned"
        );
        Ok(report)
    }

    fn ensure_link(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        report: &mut ProvisionReport,
    ) -> Result<(), ProvisionError> {
        let links = LinkProvisioner::new(self.ctx);
        if links
            .exists_in_namespace(iface, namespace)
            .in_step(ProvisionStep::CreateLink)?
        {
            tracing::info!(interface = %iface, %namespace, "link already inside namespace");
            report.record(ProvisionStep::CreateLink, StepOutcome::AlreadySatisfied);
            report.record(ProvisionStep::MoveLink, StepOutcome::AlreadySatisfied);
            return Ok(());
        }

        let step = ProvisionStep::CreateLink;
        report.record(step, links.create_tunnel_link(iface).in_step(step)?);

        let step = ProvisionStep::MoveLink;
        report.record(step, links.move_to_namespace(iface, namespace).in_step(step)?);
        Ok(())
    }
}
