//! # wgns-common
//!
//! Shared types, error definitions, configuration model, and constants
//! used across the wgns workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the validated names, address literals, and
//! error taxonomy every other crate builds upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
