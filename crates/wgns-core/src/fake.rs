//! In-memory stand-in for the kernel as seen through `ip -j`.
//!
//! Understands exactly the command shapes this crate issues and answers
//! with the same diagnostics the real tool prints, so classification code is
//! exercised against realistic text.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;

use serde_json::json;
use wgns_common::types::NamespaceName;

use crate::gateway::{CommandFailure, CommandGateway, CommandOutput, CommandResult};

pub const EEXIST: &str = "RTNETLINK answers: File exists";
pub const EPERM: &str = "RTNETLINK answers: Operation not permitted";
pub const ADDRESS_ASSIGNED_V4: &str = "Error: ipv4: Address already assigned.";
pub const ADDRESS_ASSIGNED_V6: &str = "Error: ipv6: address already assigned.";

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub namespace: Option<String>,
    pub argv: Vec<String>,
    pub stdin: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
struct Link {
    kind: String,
    mtu: u32,
    up: bool,
}

#[derive(Debug, Default)]
struct State {
    namespaces: Vec<String>,
    /// Keyed by (namespace, name); `None` is the host.
    links: HashMap<(Option<String>, String), Link>,
    host_routes: HashMap<IpAddr, String>,
    default_route: Option<String>,
    addresses: Vec<(String, String, String)>,
    routes: Vec<(String, String, String)>,
    setconf: Vec<(String, String, String)>,
    faults: Vec<(Vec<String>, String)>,
    log: Vec<Invocation>,
}

#[derive(Debug, Default)]
pub struct FakeKernel {
    state: Mutex<State>,
}

impl FakeKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(self, name: &str) -> Self {
        self.state.lock().unwrap().namespaces.push(name.to_string());
        self
    }

    /// Adds a link; `namespace == None` places it on the host.
    pub fn with_link(self, namespace: Option<&str>, name: &str, kind: &str, mtu: u32) -> Self {
        let _ = self.state.lock().unwrap().links.insert(
            (namespace.map(str::to_string), name.to_string()),
            Link {
                kind: kind.to_string(),
                mtu,
                up: true,
            },
        );
        self
    }

    pub fn with_route(self, destination: &str, device: &str) -> Self {
        let _ = self
            .state
            .lock()
            .unwrap()
            .host_routes
            .insert(destination.parse().unwrap(), device.to_string());
        self
    }

    pub fn with_default_route(self, device: &str) -> Self {
        self.state.lock().unwrap().default_route = Some(device.to_string());
        self
    }

    /// Makes every command containing `pattern` fail with `message`.
    pub fn fail_when(self, pattern: &[&str], message: &str) -> Self {
        self.state.lock().unwrap().faults.push((
            pattern.iter().map(ToString::to_string).collect(),
            message.to_string(),
        ));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().unwrap().log.clone()
    }

    /// Number of invocations whose argv contains `pattern`.
    pub fn count(&self, pattern: &[&str]) -> usize {
        self.invocations()
            .iter()
            .filter(|inv| contains(&inv.argv, pattern))
            .count()
    }

    pub fn link_location(&self, name: &str) -> Option<Option<String>> {
        self.state
            .lock()
            .unwrap()
            .links
            .keys()
            .find(|(_, n)| n == name)
            .map(|(ns, _)| ns.clone())
    }

    pub fn link_mtu(&self, namespace: &str, name: &str) -> Option<(u32, bool)> {
        self.state
            .lock()
            .unwrap()
            .links
            .get(&(Some(namespace.to_string()), name.to_string()))
            .map(|l| (l.mtu, l.up))
    }

    pub fn addresses(&self, namespace: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .addresses
            .iter()
            .filter(|(ns, _, _)| ns == namespace)
            .map(|(_, _, cidr)| cidr.clone())
            .collect()
    }

    pub fn routes(&self, namespace: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .routes
            .iter()
            .filter(|(ns, _, _)| ns == namespace)
            .map(|(_, _, cidr)| cidr.clone())
            .collect()
    }

    pub fn last_setconf(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .setconf
            .last()
            .map(|(_, _, text)| text.clone())
    }
}

fn contains<P: AsRef<str>>(argv: &[String], pattern: &[P]) -> bool {
    pattern.is_empty()
        || argv
            .windows(pattern.len())
            .any(|w| w.iter().zip(pattern).all(|(arg, p)| arg == p.as_ref()))
}

fn fail(argv: &[&str], message: impl Into<String>) -> CommandResult {
    Err(CommandFailure::new(format!("ip -j {}", argv.join(" ")), message))
}

impl CommandGateway for FakeKernel {
    #[allow(clippy::too_many_lines)]
    fn execute(
        &self,
        argv: &[&str],
        namespace: Option<&NamespaceName>,
        stdin: Option<&[u8]>,
    ) -> CommandResult {
        let mut state = self.state.lock().unwrap();
        let owned: Vec<String> = argv.iter().map(ToString::to_string).collect();
        state.log.push(Invocation {
            namespace: namespace.map(|n| n.as_str().to_string()),
            argv: owned.clone(),
            stdin: stdin.map(<[u8]>::to_vec),
        });

        if let Some((_, message)) = state.faults.iter().find(|(p, _)| contains(&owned, p)) {
            return fail(argv, message.clone());
        }

        let scope = namespace.map(|n| n.as_str().to_string());
        if let Some(ns) = &scope {
            if !state.namespaces.contains(ns) {
                return fail(
                    argv,
                    format!("Cannot open network namespace \"{ns}\": No such file or directory"),
                );
            }
        }

        match argv {
            ["netns", "list"] => {
                if state.namespaces.is_empty() {
                    return Ok(CommandOutput::Completed);
                }
                let items: Vec<_> = state.namespaces.iter().map(|n| json!({ "name": n })).collect();
                Ok(CommandOutput::Structured(json!(items)))
            }
            ["netns", "add", name] => {
                if state.namespaces.iter().any(|n| n == name) {
                    return fail(
                        argv,
                        format!("Cannot create namespace file \"/var/run/netns/{name}\": File exists"),
                    );
                }
                state.namespaces.push((*name).to_string());
                Ok(CommandOutput::Completed)
            }
            ["netns", "exec", ns, _wg, "setconf", iface, "/dev/stdin"] => {
                if !state.namespaces.iter().any(|n| n == ns) {
                    return fail(argv, format!("Cannot open network namespace \"{ns}\": No such file or directory"));
                }
                if !state.links.contains_key(&(Some((*ns).to_string()), (*iface).to_string())) {
                    return fail(argv, "Unable to modify interface: No such device");
                }
                let text = String::from_utf8_lossy(stdin.unwrap_or_default()).into_owned();
                state.setconf.push(((*ns).to_string(), (*iface).to_string(), text));
                Ok(CommandOutput::Completed)
            }
            ["link", "add", "dev", name, "type", kind] => {
                let key = (scope, (*name).to_string());
                if state.links.contains_key(&key) {
                    return fail(argv, EEXIST);
                }
                let _ = state.links.insert(
                    key,
                    Link {
                        kind: (*kind).to_string(),
                        mtu: 1420,
                        up: false,
                    },
                );
                Ok(CommandOutput::Completed)
            }
            ["-d", "link", "show", "dev", name] => match state.links.get(&(scope, (*name).to_string())) {
                Some(link) => Ok(CommandOutput::Structured(json!([{
                    "ifname": name,
                    "mtu": link.mtu,
                    "linkinfo": { "info_kind": link.kind },
                }]))),
                None => fail(argv, format!("Device \"{name}\" does not exist.")),
            },
            ["link", "show", name] | ["link", "show", "dev", name] => {
                match state.links.get(&(scope, (*name).to_string())) {
                    Some(link) => Ok(CommandOutput::Structured(json!([{
                        "ifname": name,
                        "mtu": link.mtu,
                        "operstate": if link.up { "UNKNOWN" } else { "DOWN" },
                    }]))),
                    None => fail(argv, format!("Device \"{name}\" does not exist.")),
                }
            }
            ["link", "set", name, "netns", target] => {
                if !state.namespaces.iter().any(|n| n == target) {
                    return fail(argv, format!("Invalid \"netns\" value: \"{target}\""));
                }
                let Some(link) = state.links.remove(&(scope, (*name).to_string())) else {
                    return fail(argv, format!("Cannot find device \"{name}\""));
                };
                let _ = state
                    .links
                    .insert((Some((*target).to_string()), (*name).to_string()), link);
                Ok(CommandOutput::Completed)
            }
            ["link", "set", "mtu", mtu, "up", "dev", name] => {
                let Some(link) = state.links.get_mut(&(scope, (*name).to_string())) else {
                    return fail(argv, format!("Cannot find device \"{name}\""));
                };
                link.mtu = mtu.parse().unwrap();
                link.up = true;
                Ok(CommandOutput::Completed)
            }
            [family, "address", "add", cidr, "dev", name] => {
                let ns = scope.unwrap_or_default();
                if !state.links.contains_key(&(Some(ns.clone()), (*name).to_string())) {
                    return fail(argv, format!("Cannot find device \"{name}\""));
                }
                let entry = (ns, (*name).to_string(), (*cidr).to_string());
                if state.addresses.contains(&entry) {
                    return fail(
                        argv,
                        if *family == "-6" {
                            ADDRESS_ASSIGNED_V6
                        } else {
                            ADDRESS_ASSIGNED_V4
                        },
                    );
                }
                state.addresses.push(entry);
                Ok(CommandOutput::Completed)
            }
            [_family, "route", "add", cidr, "dev", name] => {
                let ns = scope.unwrap_or_default();
                if !state.links.contains_key(&(Some(ns.clone()), (*name).to_string())) {
                    return fail(argv, format!("Cannot find device \"{name}\""));
                }
                let entry = (ns, (*name).to_string(), (*cidr).to_string());
                if state.routes.iter().any(|(n, _, c)| *n == entry.0 && *c == entry.2) {
                    return fail(argv, EEXIST);
                }
                state.routes.push(entry);
                Ok(CommandOutput::Completed)
            }
            ["route", "get", addr] => {
                let Ok(parsed) = addr.parse::<IpAddr>() else {
                    return fail(argv, format!("Error: any valid prefix is expected rather than \"{addr}\"."));
                };
                match state.host_routes.get(&parsed) {
                    Some(dev) => Ok(CommandOutput::Structured(json!([{ "dst": addr, "dev": dev }]))),
                    None => fail(argv, "RTNETLINK answers: Network is unreachable"),
                }
            }
            ["route", "show", "default"] => match &state.default_route {
                Some(dev) => Ok(CommandOutput::Structured(json!([{ "dst": "default", "dev": dev }]))),
                None => Ok(CommandOutput::Completed),
            },
            _ => fail(argv, format!("fake kernel: unsupported command {argv:?}")),
        }
    }
}
