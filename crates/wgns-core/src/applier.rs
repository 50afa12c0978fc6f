//! Applies a tunnel configuration to a link that already lives in its
//! namespace.
//!
//! Steps run strictly in order: peer config, addresses, MTU and link state,
//! DNS, routes. Answers saying an address or route is already present are
//! absorbed; every other failure stops the sequence and is reported with its
//! step.

use nix::errno::Errno;
use wgns_common::error::Result;
use wgns_common::types::{Cidr, InterfaceName, NamespaceName};
use wgns_config::TunnelConfig;

use crate::context::NetContext;
use crate::gateway::CommandFailure;
use crate::mtu::{MtuResolver, tunnel_mtu};
use crate::namespace::NamespaceManager;
use crate::outcome::{InStep, ProvisionError, ProvisionReport, ProvisionStep, StepOutcome};
use crate::setconf;

/// Phrase newer kernels print for a duplicate `ip address add`, in either
/// capitalization.
const ADDRESS_ASSIGNED: &str = "already assigned";

/// Drives the configuration steps for one interface.
#[derive(Clone, Copy)]
pub struct ConfigApplier<'a> {
    ctx: NetContext<'a>,
}

impl<'a> ConfigApplier<'a> {
    /// Creates an applier working through `ctx`.
    #[must_use]
    pub const fn new(ctx: NetContext<'a>) -> Self {
        Self { ctx }
    }

    /// Applies `config` to `iface` inside `namespace`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal failure, tagged with its step. Steps that
    /// already ran are left in place.
    pub fn apply(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        config: &TunnelConfig,
    ) -> std::result::Result<ProvisionReport, ProvisionError> {
        let mut report = ProvisionReport::default();
        self.apply_into(iface, namespace, config, &mut report)?;
        Ok(report)
    }

    /// Like [`ConfigApplier::apply`], recording into an existing report.
    ///
    /// # Errors
    ///
    /// Returns the first fatal failure, tagged with its step.
    pub fn apply_into(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        config: &TunnelConfig,
        report: &mut ProvisionReport,
    ) -> std::result::Result<(), ProvisionError> {
        let step = ProvisionStep::PushPeerConfig;
        report.record(step, self.push_peer_config(iface, namespace, config).in_step(step)?);

        let step = ProvisionStep::AssignAddresses;
        let addresses = &config.interface.addresses;
        report.record(step, self.assign_addresses(iface, namespace, addresses).in_step(step)?);

        let step = ProvisionStep::SetMtuAndUp;
        report.record(step, self.set_mtu_and_up(iface, namespace, config).in_step(step)?);

        if let Some(dns) = &config.interface.dns {
            let step = ProvisionStep::InstallDns;
            let outcome = NamespaceManager::new(self.ctx)
                .set_dns(namespace, &dns.resolvers, dns.search.as_deref())
                .in_step(step)?;
            report.record(step, outcome);
        } else {
            tracing::debug!(%namespace, "no DNS settings; leaving resolver file alone");
        }

        let step = ProvisionStep::InstallRoutes;
        report.record(step, self.install_routes(iface, namespace, config).in_step(step)?);
        Ok(())
    }

    /// Loads keys and peers into the interface with `wg setconf`.
    ///
    /// The rendered text travels over standard input only.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the `wg` invocation.
    pub fn push_peer_config(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        config: &TunnelConfig,
    ) -> Result<StepOutcome> {
        let text = setconf::render(config);
        let wg = self.ctx.config.wg_path.to_string_lossy().into_owned();
        let argv = [
            "netns",
            "exec",
            namespace.as_str(),
            wg.as_str(),
            "setconf",
            iface.as_str(),
            "/dev/stdin",
        ];
        self.ctx
            .gateway
            .execute(&argv, None, Some(text.as_bytes()))
            .map_err(CommandFailure::into_error)?;
        tracing::info!(interface = %iface, %namespace, peers = config.peers.len(), "peer configuration loaded");
        Ok(StepOutcome::Applied)
    }

    /// Assigns each address to the interface.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the first address that could not
    /// be added for a reason other than already being present.
    pub fn assign_addresses(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        addresses: &[Cidr],
    ) -> Result<StepOutcome> {
        addresses
            .iter()
            .try_fold(StepOutcome::AlreadySatisfied, |acc, cidr| {
                let outcome = self.add_in_namespace("address", iface, namespace, cidr)?;
                Ok(acc.merge(outcome))
            })
    }

    /// Sets the tunnel MTU from the resolved path MTU and brings the link up.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the `ip link set` invocation.
    pub fn set_mtu_and_up(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        config: &TunnelConfig,
    ) -> Result<StepOutcome> {
        let path_mtu = MtuResolver::new(self.ctx).resolve(config);
        let mtu = tunnel_mtu(path_mtu).to_string();
        self.ctx
            .gateway
            .execute(
                &["link", "set", "mtu", mtu.as_str(), "up", "dev", iface.as_str()],
                Some(namespace),
                None,
            )
            .map_err(CommandFailure::into_error)?;
        tracing::info!(interface = %iface, %namespace, path_mtu, mtu = %mtu, "link is up");
        Ok(StepOutcome::Applied)
    }

    /// Routes every peer's allowed ranges through the interface.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the first route that could not be
    /// added for a reason other than already being present.
    pub fn install_routes(
        &self,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        config: &TunnelConfig,
    ) -> Result<StepOutcome> {
        config
            .peers
            .iter()
            .flat_map(|peer| &peer.allowed_ips)
            .try_fold(StepOutcome::AlreadySatisfied, |acc, cidr| {
                let outcome = self.add_in_namespace("route", iface, namespace, cidr)?;
                Ok(acc.merge(outcome))
            })
    }

    /// Runs `ip -4|-6 <object> add <cidr> dev <iface>` in the namespace.
    fn add_in_namespace(
        &self,
        object: &str,
        iface: &InterfaceName,
        namespace: &NamespaceName,
        cidr: &Cidr,
    ) -> Result<StepOutcome> {
        let target = cidr.to_string();
        let argv = [cidr.family_flag(), object, "add", target.as_str(), "dev", iface.as_str()];
        match self.ctx.gateway.execute(&argv, Some(namespace), None) {
            Ok(_) => {
                tracing::debug!(object, %cidr, interface = %iface, "added");
                Ok(StepOutcome::Applied)
            }
            Err(failure) if already_present(object, &failure) => {
                tracing::info!(object, %cidr, interface = %iface, "already present");
                Ok(StepOutcome::AlreadySatisfied)
            }
            Err(failure) => Err(failure.into_error()),
        }
    }
}

fn already_present(object: &str, failure: &CommandFailure) -> bool {
    failure.is(Errno::EEXIST)
        || (object == "address"
            && failure
                .message
                .to_ascii_lowercase()
                .contains(ADDRESS_ASSIGNED))
}

#[cfg(test)]
mod tests {
    use wgns_common::config::WgnsConfig;
    use wgns_common::error::WgnsError;
    use wgns_config::parser::parse_tunnel_config;

    use super::*;
    use crate::fake::{ADDRESS_ASSIGNED_V4, ADDRESS_ASSIGNED_V6, EEXIST, EPERM, FakeKernel};

    const DOC: &str = "\
[Interface]
PrivateKey = YIEsWKsiWrJhNdze0ypYEiCK7ZwGrcrADMSggejlsWY=
Address = 10.64.0.2/32, fd00:64::2/128
DNS = 10.64.0.1, vpn.internal

[Peer]
PublicKey = mx+CoeSCAh6cqPWK84KhdSXymYdOuflGjkdXPNunfEs=
Endpoint = 203.0.113.5:51820
AllowedIPs = 0.0.0.0/0, ::/0
";

    fn names() -> (InterfaceName, NamespaceName) {
        (
            InterfaceName::new("wg0").unwrap(),
            NamespaceName::new("vpn").unwrap(),
        )
    }

    fn kernel() -> FakeKernel {
        FakeKernel::new()
            .with_namespace("vpn")
            .with_link(Some("vpn"), "wg0", "wireguard", 1420)
            .with_link(None, "eth0", "ether", 1500)
            .with_default_route("eth0")
    }

    fn settings(dir: &std::path::Path) -> WgnsConfig {
        WgnsConfig {
            netns_etc_dir: dir.to_path_buf(),
            ..WgnsConfig::default()
        }
    }

    #[test]
    fn applies_every_step_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel();
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();

        let report = applier
            .apply(&iface, &ns, &parse_tunnel_config(DOC).unwrap())
            .unwrap();

        let steps: Vec<_> = report.steps.iter().map(|r| r.step).collect();
        assert_eq!(
            steps,
            vec![
                ProvisionStep::PushPeerConfig,
                ProvisionStep::AssignAddresses,
                ProvisionStep::SetMtuAndUp,
                ProvisionStep::InstallDns,
                ProvisionStep::InstallRoutes,
            ]
        );
        assert_eq!(kernel.addresses("vpn"), vec!["10.64.0.2/32", "fd00:64::2/128"]);
        assert_eq!(kernel.routes("vpn"), vec!["0.0.0.0/0", "::/0"]);
        assert_eq!(kernel.link_mtu("vpn", "wg0"), Some((1420, true)));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("vpn/resolv.conf")).unwrap(),
            "nameserver 10.64.0.1\nsearch vpn.internal\n"
        );
    }

    #[test]
    fn private_key_travels_on_stdin_only() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel();
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();

        let _ = applier
            .push_peer_config(&iface, &ns, &parse_tunnel_config(DOC).unwrap())
            .unwrap();

        let setconf = kernel.last_setconf().unwrap();
        assert!(setconf.contains("PrivateKey = YIEs"));
        for inv in kernel.invocations() {
            assert!(inv.argv.iter().all(|arg| !arg.contains("YIEs")));
            assert!(inv.namespace.is_none());
            assert!(inv.stdin.is_some_and(|input| input == setconf.as_bytes()));
        }
    }

    #[test]
    fn existing_addresses_and_routes_are_absorbed() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel();
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();
        let tunnel = parse_tunnel_config(DOC).unwrap();

        let _ = applier.apply(&iface, &ns, &tunnel).unwrap();
        let again = applier.apply(&iface, &ns, &tunnel).unwrap();

        assert_eq!(
            again.outcome_of(ProvisionStep::AssignAddresses),
            Some(StepOutcome::AlreadySatisfied)
        );
        assert_eq!(
            again.outcome_of(ProvisionStep::InstallRoutes),
            Some(StepOutcome::AlreadySatisfied)
        );
        assert_eq!(
            again.outcome_of(ProvisionStep::InstallDns),
            Some(StepOutcome::AlreadySatisfied)
        );
        assert_eq!(kernel.addresses("vpn").len(), 2);
    }

    #[test]
    fn address_already_assigned_answer_is_absorbed() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel()
            .fail_when(&["-4", "address", "add"], ADDRESS_ASSIGNED_V4)
            .fail_when(&["-6", "address", "add"], ADDRESS_ASSIGNED_V6);
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();

        let report = applier
            .apply(&iface, &ns, &parse_tunnel_config(DOC).unwrap())
            .unwrap();
        assert_eq!(
            report.outcome_of(ProvisionStep::AssignAddresses),
            Some(StepOutcome::AlreadySatisfied)
        );
        assert_eq!(kernel.routes("vpn"), vec!["0.0.0.0/0", "::/0"]);
    }

    #[test]
    fn assigning_the_same_addresses_twice_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel();
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();
        let addresses = parse_tunnel_config(DOC).unwrap().interface.addresses;

        assert_eq!(
            applier.assign_addresses(&iface, &ns, &addresses).unwrap(),
            StepOutcome::Applied
        );
        assert_eq!(
            applier.assign_addresses(&iface, &ns, &addresses).unwrap(),
            StepOutcome::AlreadySatisfied
        );
        assert_eq!(kernel.addresses("vpn").len(), 2);
    }

    #[test]
    fn already_assigned_phrase_does_not_excuse_routes() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel().fail_when(&["route", "add"], ADDRESS_ASSIGNED_V4);
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();

        let err = applier
            .apply(&iface, &ns, &parse_tunnel_config(DOC).unwrap())
            .unwrap_err();
        assert_eq!(err.step, ProvisionStep::InstallRoutes);
        assert!(matches!(err.source, WgnsError::CommandFailed { .. }));
    }

    #[test]
    fn route_exists_answer_does_not_abort() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel().fail_when(&["route", "add", "0.0.0.0/0"], EEXIST);
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();

        let report = applier
            .apply(&iface, &ns, &parse_tunnel_config(DOC).unwrap())
            .unwrap();
        assert_eq!(
            report.outcome_of(ProvisionStep::InstallRoutes),
            Some(StepOutcome::Applied)
        );
        assert_eq!(kernel.routes("vpn"), vec!["::/0"]);
    }

    #[test]
    fn permission_failure_stops_at_its_step() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel().fail_when(&["address", "add"], EPERM);
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();

        let err = applier
            .apply(&iface, &ns, &parse_tunnel_config(DOC).unwrap())
            .unwrap_err();
        assert_eq!(err.step, ProvisionStep::AssignAddresses);
        assert!(matches!(err.source, WgnsError::PermissionDenied { .. }));
        assert_eq!(kernel.count(&["link", "set", "mtu"]), 0);
        assert!(kernel.routes("vpn").is_empty());
    }

    #[test]
    fn config_without_dns_skips_resolver_step() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel();
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();
        let doc = DOC.replace("DNS = 10.64.0.1, vpn.internal\n", "");

        let report = applier
            .apply(&iface, &ns, &parse_tunnel_config(&doc).unwrap())
            .unwrap();
        assert_eq!(report.outcome_of(ProvisionStep::InstallDns), None);
        assert!(!tmp.path().join("vpn").exists());
    }

    #[test]
    fn mtu_uses_peer_route_minus_overhead() {
        let tmp = tempfile::tempdir().unwrap();
        let kernel = kernel()
            .with_link(None, "ppp0", "ppp", 1492)
            .with_route("203.0.113.5", "ppp0");
        let config = settings(tmp.path());
        let applier = ConfigApplier::new(NetContext::new(&kernel, &config));
        let (iface, ns) = names();

        let _ = applier
            .set_mtu_and_up(&iface, &ns, &parse_tunnel_config(DOC).unwrap())
            .unwrap();
        assert_eq!(kernel.link_mtu("vpn", "wg0"), Some((1412, true)));
        assert_eq!(kernel.count(&["link", "set", "mtu", "1412", "up", "dev", "wg0"]), 1);
    }
}
