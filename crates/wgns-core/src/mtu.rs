//! Path MTU discovery for the tunnel interface.
//!
//! The usable MTU is taken from, in order: an explicit setting, the device
//! carrying the route to each peer endpoint, the device carrying the default
//! route, and finally [`FALLBACK_MTU`]. Probe failures never abort discovery;
//! they just move on to the next candidate.

use std::net::IpAddr;

use wgns_common::constants::{FALLBACK_MTU, TUNNEL_OVERHEAD};
use wgns_config::TunnelConfig;

use crate::context::NetContext;

/// What a route lookup is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// The route the host would use to reach this address.
    Address(IpAddr),
    /// The default route.
    Default,
}

/// A successful route probe: the outgoing device and its MTU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteProbe {
    /// Outgoing device name.
    pub device: String,
    /// MTU reported by that device.
    pub mtu: u32,
}

/// Resolves the path MTU from the host route table.
#[derive(Clone, Copy)]
pub struct MtuResolver<'a> {
    ctx: NetContext<'a>,
}

impl<'a> MtuResolver<'a> {
    /// Creates a resolver working through `ctx`.
    #[must_use]
    pub const fn new(ctx: NetContext<'a>) -> Self {
        Self { ctx }
    }

    /// Returns the path MTU for `config`, before tunnel overhead.
    #[must_use]
    pub fn resolve(&self, config: &TunnelConfig) -> u32 {
        if let Some(mtu) = config.interface.mtu {
            tracing::debug!(mtu, "using configured MTU");
            return mtu;
        }

        for peer in &config.peers {
            let Some(addr) = peer.endpoint.ip() else {
                tracing::debug!(endpoint = %peer.endpoint, "endpoint is not an address; skipping");
                continue;
            };
            if let Some(found) = self.probe(RouteTarget::Address(addr)) {
                tracing::debug!(endpoint = %peer.endpoint, device = %found.device, mtu = found.mtu, "MTU from endpoint route");
                return found.mtu;
            }
        }

        if let Some(found) = self.probe(RouteTarget::Default) {
            tracing::debug!(device = %found.device, mtu = found.mtu, "MTU from default route");
            return found.mtu;
        }

        tracing::debug!(mtu = FALLBACK_MTU, "no usable route; using fallback MTU");
        FALLBACK_MTU
    }

    /// Looks up the device for `target` and reads its MTU.
    ///
    /// Returns `None` if any part of the lookup fails or yields no number.
    pub fn probe(&self, target: RouteTarget) -> Option<RouteProbe> {
        let addr = match target {
            RouteTarget::Address(ip) => Some(ip.to_string()),
            RouteTarget::Default => None,
        };
        let argv = match &addr {
            Some(addr) => vec!["route", "get", addr.as_str()],
            None => vec!["route", "show", "default"],
        };
        let route = self
            .ctx
            .gateway
            .execute(&argv, None, None)
            .map_err(|failure| {
                tracing::debug!(?target, reason = %failure.message, "route probe failed");
            })
            .ok()?;
        let device = route.first_str("dev")?.to_string();

        let link = self
            .ctx
            .gateway
            .execute(&["link", "show", "dev", device.as_str()], None, None)
            .map_err(|failure| {
                tracing::debug!(%device, reason = %failure.message, "device probe failed");
            })
            .ok()?;
        let mtu = link
            .items()
            .first()?
            .get("mtu")?
            .as_u64()
            .and_then(|m| u32::try_from(m).ok())?;
        Some(RouteProbe { device, mtu })
    }
}

/// Returns the MTU to set on the tunnel for a path MTU of `path_mtu`.
#[must_use]
pub const fn tunnel_mtu(path_mtu: u32) -> u32 {
    path_mtu.saturating_sub(TUNNEL_OVERHEAD)
}
