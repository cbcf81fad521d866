/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! # FAT Harness
//!
//! Test-orchestration layer for the LDAP user-registry FAT suites:
//!
//! - Bounded retry-with-timeout polling that reports "not ready yet" as a
//!   value instead of an error
//! - Readiness-marker watching over server console logs
//! - Application-server lifecycle control (start, marker waits, stop,
//!   best-effort artifact cleanup)
//! - Local LDAP server provisioning driven by a failover topology
//! - An owned suite context replacing cross-test global state
//!
//! Setup is sequential and cooperative: one task registers, provisions and
//! starts everything, then the same task tears it all down.

pub mod config;
pub mod error;
pub mod ldap;
pub mod markers;
pub mod retry;
pub mod server;
pub mod suite;

pub use config::{HarnessConfig, RetrySettings};
pub use error::{HarnessError, Result};
pub use ldap::{LdapLaunchConfig, LdapServerControl, LdapServerHandle, ProcessLdapControl};
pub use markers::LogWatcher;
pub use retry::{RetryOutcome, RetryPolicy};
pub use server::{ServerConfig, ServerInstance};
pub use suite::{provision, SuiteContext};
