//! Tunnel link creation, relocation, and probes.

use nix::errno::Errno;
use wgns_common::constants::TUNNEL_LINK_KIND;
use wgns_common::error::{Result, WgnsError};
use wgns_common::types::{InterfaceName, NamespaceName};

use crate::context::NetContext;
use crate::outcome::StepOutcome;

/// Phrase `ip` prints when a device lookup finds nothing.
const DEVICE_MISSING: &str = "does not exist";

/// Phrase `ip link set ... netns` prints for an unknown namespace.
const INVALID_NETNS: &str = "Invalid \"netns\" value";

/// Creates tunnel links and moves them between namespaces.
#[derive(Clone, Copy)]
pub struct LinkProvisioner<'a> {
    ctx: NetContext<'a>,
}

impl<'a> LinkProvisioner<'a> {
    /// Creates a provisioner working through `ctx`.
    #[must_use]
    pub const fn new(ctx: NetContext<'a>) -> Self {
        Self { ctx }
    }

    /// Adds a tunnel link called `name` on the host.
    ///
    /// An existing tunnel link of the same name satisfies the request; a
    /// link of any other kind holding the name does not.
    ///
    /// # Errors
    ///
    /// Returns [`WgnsError::AlreadyExists`] if the name is taken by a
    /// non-tunnel link, [`WgnsError::PermissionDenied`] without privileges,
    /// or [`WgnsError::CommandFailed`] otherwise.
    pub fn create_tunnel_link(&self, name: &InterfaceName) -> Result<StepOutcome> {
        let argv = ["link", "add", "dev", name.as_str(), "type", TUNNEL_LINK_KIND];
        match self.ctx.gateway.execute(&argv, None, None) {
            Ok(_) => {
                tracing::info!(interface = %name, "tunnel link created");
                Ok(StepOutcome::Applied)
            }
            Err(failure) if failure.is(Errno::EEXIST) => {
                match self.link_kind(name, None)?.as_deref() {
                    Some(TUNNEL_LINK_KIND) => {
                        tracing::info!(interface = %name, "tunnel link already present");
                        Ok(StepOutcome::AlreadySatisfied)
                    }
                    kind => {
                        tracing::warn!(interface = %name, kind = ?kind, "name taken by another link");
                        Err(WgnsError::AlreadyExists {
                            kind: "link",
                            id: name.to_string(),
                        })
                    }
                }
            }
            Err(failure) => Err(failure.into_error()),
        }
    }

    /// Returns the link type of `name` (e.g. `wireguard`, `veth`), or
    /// `None` when no such link exists in the given scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe fails for any reason other than the
    /// link being absent.
    pub fn link_kind(
        &self,
        name: &InterfaceName,
        namespace: Option<&NamespaceName>,
    ) -> Result<Option<String>> {
        match self
            .ctx
            .gateway
            .execute(&["-d", "link", "show", "dev", name.as_str()], namespace, None)
        {
            Ok(output) => Ok(output
                .items()
                .first()
                .and_then(|item| item.get("linkinfo")?.get("info_kind")?.as_str())
                .map(str::to_string)),
            Err(failure) if failure.mentions(DEVICE_MISSING) => Ok(None),
            Err(failure) => Err(failure.into_error()),
        }
    }

    /// Moves host link `name` into `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`WgnsError::NotFound`] with kind `interface` if the link is
    /// not on the host, or with kind `namespace` if the target namespace
    /// does not exist. Privilege failures map to
    /// [`WgnsError::PermissionDenied`].
    pub fn move_to_namespace(
        &self,
        name: &InterfaceName,
        namespace: &NamespaceName,
    ) -> Result<StepOutcome> {
        if !self.probe(name, None)? {
            return Err(WgnsError::NotFound {
                kind: "interface",
                id: name.to_string(),
            });
        }
        let argv = ["link", "set", name.as_str(), "netns", namespace.as_str()];
        match self.ctx.gateway.execute(&argv, None, None) {
            Ok(_) => {
                tracing::info!(interface = %name, %namespace, "link moved into namespace");
                Ok(StepOutcome::Applied)
            }
            Err(failure) if failure.mentions(INVALID_NETNS) => Err(namespace_missing(namespace)),
            Err(failure) => Err(failure.into_error()),
        }
    }

    /// Returns `true` if link `name` is present inside `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`WgnsError::NotFound`] with kind `namespace` if the namespace
    /// cannot be entered, or the classified failure for anything else.
    pub fn exists_in_namespace(
        &self,
        name: &InterfaceName,
        namespace: &NamespaceName,
    ) -> Result<bool> {
        self.probe(name, Some(namespace)).map_err(|e| match e {
            WgnsError::CommandFailed { ref message, .. }
                if message.contains(Errno::ENOENT.desc()) =>
            {
                namespace_missing(namespace)
            }
            other => other,
        })
    }

    fn probe(&self, name: &InterfaceName, namespace: Option<&NamespaceName>) -> Result<bool> {
        match self
            .ctx
            .gateway
            .execute(&["link", "show", "dev", name.as_str()], namespace, None)
        {
            Ok(_) => Ok(true),
            Err(failure) if failure.mentions(DEVICE_MISSING) => Ok(false),
            Err(failure) => Err(failure.into_error()),
        }
    }
}

fn namespace_missing(namespace: &NamespaceName) -> WgnsError {
    WgnsError::NotFound {
        kind: "namespace",
        id: namespace.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use wgns_common::config::WgnsConfig;

    use super::*;
    use crate::fake::{EPERM, FakeKernel};

    fn iface(name: &str) -> InterfaceName {
        InterfaceName::new(name).unwrap()
    }

    fn ns(name: &str) -> NamespaceName {
        NamespaceName::new(name).unwrap()
    }

    #[test]
    fn create_adds_wireguard_link_on_host() {
        let kernel = FakeKernel::new();
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        assert_eq!(links.create_tunnel_link(&iface("wg0")).unwrap(), StepOutcome::Applied);
        assert_eq!(kernel.link_location("wg0"), Some(None));
        assert_eq!(
            links.link_kind(&iface("wg0"), None).unwrap().as_deref(),
            Some("wireguard")
        );
    }

    #[test]
    fn create_existing_tunnel_link_is_already_satisfied() {
        let kernel = FakeKernel::new().with_link(None, "wg0", "wireguard", 1420);
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        assert_eq!(
            links.create_tunnel_link(&iface("wg0")).unwrap(),
            StepOutcome::AlreadySatisfied
        );
    }

    #[test]
    fn create_over_foreign_link_is_already_exists() {
        let kernel = FakeKernel::new().with_link(None, "wg0", "veth", 1500);
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        let err = links.create_tunnel_link(&iface("wg0")).unwrap_err();
        assert!(matches!(err, WgnsError::AlreadyExists { kind: "link", .. }));
    }

    #[test]
    fn create_without_privileges_is_permission_denied() {
        let kernel = FakeKernel::new().fail_when(&["link", "add"], EPERM);
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        let err = links.create_tunnel_link(&iface("wg0")).unwrap_err();
        assert!(matches!(err, WgnsError::PermissionDenied { .. }));
    }

    #[test]
    fn create_other_failure_is_command_failed() {
        let kernel = FakeKernel::new().fail_when(
            &["link", "add"],
            "Error: Unknown device type.",
        );
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        let err = links.create_tunnel_link(&iface("wg0")).unwrap_err();
        assert!(matches!(err, WgnsError::CommandFailed { .. }));
    }

    #[test]
    fn move_relocates_link() {
        let kernel = FakeKernel::new()
            .with_namespace("vpn")
            .with_link(None, "wg0", "wireguard", 1420);
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        assert_eq!(
            links.move_to_namespace(&iface("wg0"), &ns("vpn")).unwrap(),
            StepOutcome::Applied
        );
        assert_eq!(kernel.link_location("wg0"), Some(Some("vpn".to_string())));
        assert!(links.exists_in_namespace(&iface("wg0"), &ns("vpn")).unwrap());
    }

    #[test]
    fn move_missing_host_link_is_not_found() {
        let kernel = FakeKernel::new().with_namespace("vpn");
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        let err = links.move_to_namespace(&iface("wg0"), &ns("vpn")).unwrap_err();
        assert!(matches!(err, WgnsError::NotFound { kind: "interface", .. }));
        assert_eq!(kernel.count(&["netns", "vpn"]), 0);
    }

    #[test]
    fn move_into_missing_namespace_is_not_found() {
        let kernel = FakeKernel::new().with_link(None, "wg0", "wireguard", 1420);
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        let err = links.move_to_namespace(&iface("wg0"), &ns("ghost")).unwrap_err();
        assert!(matches!(err, WgnsError::NotFound { kind: "namespace", .. }));
        assert_eq!(kernel.link_location("wg0"), Some(None));
    }

    #[test]
    fn move_without_privileges_is_permission_denied() {
        let kernel = FakeKernel::new()
            .with_namespace("vpn")
            .with_link(None, "wg0", "wireguard", 1420)
            .fail_when(&["netns", "vpn"], EPERM);
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        let err = links.move_to_namespace(&iface("wg0"), &ns("vpn")).unwrap_err();
        assert!(matches!(err, WgnsError::PermissionDenied { .. }));
    }

    #[test]
    fn absent_link_is_false_not_error() {
        let kernel = FakeKernel::new().with_namespace("vpn");
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        assert!(!links.exists_in_namespace(&iface("wg0"), &ns("vpn")).unwrap());
    }

    #[test]
    fn probe_of_missing_namespace_is_not_found() {
        let kernel = FakeKernel::new();
        let config = WgnsConfig::default();
        let links = LinkProvisioner::new(NetContext::new(&kernel, &config));

        let err = links.exists_in_namespace(&iface("wg0"), &ns("ghost")).unwrap_err();
        assert!(matches!(err, WgnsError::NotFound { kind: "namespace", .. }));
    }
}
