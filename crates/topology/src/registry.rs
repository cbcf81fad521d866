/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Failover topology registry
//!
//! Accumulates primary/failover server pairs during suite setup. The
//! registry is built with repeated `register` calls and consumed once by
//! provisioning; insertion order within a primary's sequence determines
//! failover trial order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::endpoint::{PrimaryKey, ServerEndpoint};

/// One primary → failover pair.
///
/// Multiple mappings may share the same primary (alternative failovers
/// registered under different port combinations) and multiple mappings may
/// share the same failover target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverMapping {
    pub primary: ServerEndpoint,
    pub failover: ServerEndpoint,
}

/// Registry of failover mappings keyed by primary identity.
///
/// Replaces the old nullable-accumulator pattern with an explicit
/// constructor and a chaining append, so ownership is unambiguous from the
/// first call: create with [`TopologyRegistry::new`], extend with
/// [`TopologyRegistry::register`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyRegistry {
    /// Mapping sequences per primary key
    mappings: HashMap<PrimaryKey, Vec<FailoverMapping>>,
    /// Primary keys in first-registration order
    order: Vec<PrimaryKey>,
}

impl TopologyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primary → failover mapping.
    ///
    /// The sequence for the primary's key is created on first use; repeated
    /// registration under the same key accumulates entries rather than
    /// overwriting. Returns `&mut Self` so suite setup can chain calls.
    pub fn register(&mut self, primary: ServerEndpoint, failover: ServerEndpoint) -> &mut Self {
        let key = primary.key();
        debug!(primary = %key, failover = %failover, "registering failover mapping");

        let sequence = self.mappings.entry(key.clone()).or_insert_with(|| {
            self.order.push(key);
            Vec::new()
        });
        sequence.push(FailoverMapping { primary, failover });
        self
    }

    /// Failover mappings registered under a primary key, in insertion order
    pub fn failovers_for(&self, key: &PrimaryKey) -> &[FailoverMapping] {
        self.mappings.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Primary keys in first-registration order
    pub fn primaries(&self) -> impl Iterator<Item = &PrimaryKey> {
        self.order.iter()
    }

    /// Total number of registered mappings across all primaries
    pub fn mapping_count(&self) -> usize {
        self.mappings.values().map(Vec::len).sum()
    }

    /// True when no mapping has been registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every distinct endpoint referenced by the topology, primaries first,
    /// then failovers, each in first-reference order. This is the start
    /// list the provisioning routine walks.
    pub fn endpoints(&self) -> Vec<&ServerEndpoint> {
        let mut seen: Vec<&ServerEndpoint> = Vec::new();
        for key in &self.order {
            for mapping in &self.mappings[key] {
                if !seen.contains(&&mapping.primary) {
                    seen.push(&mapping.primary);
                }
            }
        }
        for key in &self.order {
            for mapping in &self.mappings[key] {
                if !seen.contains(&&mapping.failover) {
                    seen.push(&mapping.failover);
                }
            }
        }
        seen
    }
}
