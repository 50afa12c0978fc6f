//! Domain primitive types used across the wgns workspace.
//!
//! Names and address literals are validated on construction, so anything
//! holding one of these types can hand it to the `ip` tool unchecked.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_NAMESPACE_NAME_LEN;
use crate::error::{Result, WgnsError};

fn is_alphanumeric_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Name of a network namespace.
///
/// Alphanumeric, at most [`MAX_NAMESPACE_NAME_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Validates and wraps a namespace name.
    ///
    /// # Errors
    ///
    /// Returns [`WgnsError::InvalidInput`] if the name is empty, contains a
    /// non-alphanumeric character, or is longer than 15 characters.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_alphanumeric_name(&name) || name.len() > MAX_NAMESPACE_NAME_LEN {
            return Err(WgnsError::invalid(format!(
                "namespace name not valid: {name:?} (alphanumeric, at most {MAX_NAMESPACE_NAME_LEN} characters)"
            )));
        }
        Ok(Self(name))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = WgnsError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NamespaceName> for String {
    fn from(value: NamespaceName) -> Self {
        value.0
    }
}

/// Name of a network interface (link).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Validates and wraps an interface name.
    ///
    /// # Errors
    ///
    /// Returns [`WgnsError::InvalidInput`] if the name is empty or contains a
    /// non-alphanumeric character.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_alphanumeric_name(&name) {
            return Err(WgnsError::invalid(format!(
                "interface name not valid: {name:?} (alphanumeric only)"
            )));
        }
        Ok(Self(name))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = WgnsError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<InterfaceName> for String {
    fn from(value: InterfaceName) -> Self {
        value.0
    }
}

/// An address with prefix length, e.g. `10.0.0.2/32` or `::/0`.
///
/// A bare address is accepted and gets the full host prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    addr: IpAddr,
    prefix: u8,
}

impl Cidr {
    /// Returns the address part.
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Returns `true` for an IPv6 range.
    #[must_use]
    pub const fn is_ipv6(&self) -> bool {
        self.addr.is_ipv6()
    }

    /// Address family flag understood by `ip` (`-4` or `-6`).
    #[must_use]
    pub const fn family_flag(&self) -> &'static str {
        if self.is_ipv6() { "-6" } else { "-4" }
    }
}

impl FromStr for Cidr {
    type Err = WgnsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (addr_part, prefix_part) = match s.split_once('/') {
            Some((a, p)) => (a, Some(p)),
            None => (s, None),
        };
        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| WgnsError::invalid(format!("invalid address in {s:?}")))?;
        let max = if addr.is_ipv6() { 128 } else { 32 };
        let prefix = match prefix_part {
            Some(p) => p
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= max)
                .ok_or_else(|| WgnsError::invalid(format!("invalid prefix length in {s:?}")))?,
            None => max,
        };
        Ok(Self { addr, prefix })
    }
}

impl TryFrom<String> for Cidr {
    type Error = WgnsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Cidr> for String {
    fn from(value: Cidr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

/// A peer endpoint in `host:port` form.
///
/// IPv6 literals are written in brackets (`[2001:db8::1]:51820`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Returns the host portion with any IPv6 brackets removed.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the UDP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the host as an IP address, if it is a literal.
    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

impl FromStr for Endpoint {
    type Err = WgnsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| WgnsError::invalid(format!("endpoint {s:?} is missing a port")))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| WgnsError::invalid(format!("endpoint {s:?} has an invalid port")))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(WgnsError::invalid(format!("endpoint {s:?} is missing a host")));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl TryFrom<String> for Endpoint {
    type Error = WgnsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
