//! # wgns-config
//!
//! Reads the tunnel configuration document (`/etc/wireguard/<iface>.conf`)
//! into a [`TunnelConfig`].
//!
//! Handles:
//! - **Parser**: line lexing with `nom`, section assembly, and validation.
//! - **Model**: the typed interface and peer settings.
//! - **Loader**: locating and reading the document from disk.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod loader;
pub mod model;
pub mod parser;

pub use model::{DnsSettings, InterfaceSettings, PeerSettings, SecretKey, TunnelConfig};
