//! Network namespace management.
//!
//! Namespaces are created with `ip netns add` and found with
//! `ip netns list`. Resolver configuration for processes inside a namespace
//! lives in `/etc/netns/<name>/resolv.conf`, which `ip netns exec`
//! bind-mounts over `/etc/resolv.conf`.

use std::fmt::Write as _;
use std::net::IpAddr;

use nix::errno::Errno;
use wgns_common::error::{Result, WgnsError};
use wgns_common::types::NamespaceName;

use crate::context::NetContext;
use crate::outcome::StepOutcome;

/// Creates namespaces and installs their resolver files.
#[derive(Clone, Copy)]
pub struct NamespaceManager<'a> {
    ctx: NetContext<'a>,
}

impl<'a> NamespaceManager<'a> {
    /// Creates a manager working through `ctx`.
    #[must_use]
    pub const fn new(ctx: NetContext<'a>) -> Self {
        Self { ctx }
    }

    /// Lists the names of all named network namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error if `ip netns list` fails.
    pub fn list(&self) -> Result<Vec<String>> {
        let output = self
            .ctx
            .gateway
            .execute(&["netns", "list"], None, None)
            .map_err(crate::gateway::CommandFailure::into_error)?;
        Ok(output
            .items()
            .iter()
            .filter_map(|item| item.get("name")?.as_str())
            .map(str::to_string)
            .collect())
    }

    /// Returns `true` if a namespace called `name` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespaces cannot be listed.
    pub fn exists(&self, name: &NamespaceName) -> Result<bool> {
        Ok(self.list()?.iter().any(|n| n == name.as_str()))
    }

    /// Creates namespace `name` unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`WgnsError::PermissionDenied`] without root privileges, or
    /// [`WgnsError::CommandFailed`] for any other failure.
    pub fn create(&self, name: &NamespaceName) -> Result<StepOutcome> {
        if self.exists(name)? {
            tracing::info!(namespace = %name, "namespace already exists");
            return Ok(StepOutcome::AlreadySatisfied);
        }
        match self
            .ctx
            .gateway
            .execute(&["netns", "add", name.as_str()], None, None)
        {
            Ok(_) => {
                tracing::info!(namespace = %name, "namespace created");
                Ok(StepOutcome::Applied)
            }
            Err(failure) if failure.is(Errno::EEXIST) => {
                tracing::info!(namespace = %name, "namespace appeared concurrently");
                Ok(StepOutcome::AlreadySatisfied)
            }
            Err(failure) => Err(failure.into_error()),
        }
    }

    /// Writes the resolver file for namespace `name`.
    ///
    /// The file is replaced, never appended to. When it already holds the
    /// requested content nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`WgnsError::InvalidInput`] if `resolvers` is empty, or
    /// [`WgnsError::Io`] if the file cannot be written.
    pub fn set_dns(
        &self,
        name: &NamespaceName,
        resolvers: &[IpAddr],
        search: Option<&str>,
    ) -> Result<StepOutcome> {
        if resolvers.is_empty() {
            return Err(WgnsError::invalid(format!(
                "no resolver addresses given for namespace {name}"
            )));
        }
        let content = render_resolv_conf(resolvers, search);
        let path = self.ctx.config.resolv_conf_path(name);

        if std::fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
            tracing::info!(namespace = %name, path = %path.display(), "resolver file already up to date");
            return Ok(StepOutcome::AlreadySatisfied);
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| WgnsError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&path, content).map_err(|e| WgnsError::Io {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(namespace = %name, path = %path.display(), resolvers = resolvers.len(), "resolver file written");
        Ok(StepOutcome::Applied)
    }
}

/// Renders `resolv.conf` text: one `nameserver` line per resolver, in
/// order, then an optional `search` line.
#[must_use]
pub fn render_resolv_conf(resolvers: &[IpAddr], search: Option<&str>) -> String {
    let mut out = String::new();
    for addr in resolvers {
        let _ = writeln!(out, "nameserver {addr}");
    }
    if let Some(domain) = search {
        let _ = writeln!(out, "search {domain}");
    }
    out
}
