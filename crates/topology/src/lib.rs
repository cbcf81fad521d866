/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! # LDAP Topology
//!
//! Data model for the primary/failover LDAP server topology used by the
//! registry FAT suites:
//!
//! - Immutable server endpoints (host, port, optional TLS credentials)
//! - Failover mappings pairing a primary endpoint with an alternate
//! - An ordered registry of mappings, keyed by primary identity, built
//!   incrementally with a chaining append
//!
//! The registry is a plain in-process accumulator: no I/O, no validation,
//! no process spawning. Provisioning consumes it once at suite setup.

pub mod endpoint;
pub mod registry;

pub use endpoint::{PrimaryKey, ServerEndpoint};
pub use registry::{FailoverMapping, TopologyRegistry};
