//! # wgns-core
//!
//! Provisioning of a WireGuard link inside a network namespace.
//!
//! This crate drives the `ip` tool through a [`gateway::CommandGateway`]:
//! - **Namespaces**: idempotent creation and per-namespace resolver files.
//! - **Links**: creation on the host, relocation, and existence probes.
//! - **MTU**: path MTU discovery from the host route table.
//! - **Applier**: peer config, addresses, MTU, DNS, and routes.
//! - **Orchestrator**: the complete create-move-configure workflow.
//!
//! Nothing is cached between calls; every decision is taken from a fresh
//! probe of kernel state.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod applier;
pub mod context;
pub mod gateway;
pub mod link;
pub mod mtu;
pub mod namespace;
pub mod orchestrator;
pub mod outcome;
pub mod setconf;

#[cfg(test)]
mod fake;

pub use context::NetContext;
pub use outcome::{ProvisionError, ProvisionReport, ProvisionStep, StepOutcome};
