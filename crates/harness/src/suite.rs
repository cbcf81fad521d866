/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Suite context: owned setup/teardown state
//!
//! The context object replaces the old global static suite state. Setup
//! builds a topology, hands it to [`provision`], and from then on the
//! returned context is the sole owner of the consumed topology and every
//! started LDAP process until [`SuiteContext::teardown`].

use tracing::{error, info, warn};

use ldap_topology::{ServerEndpoint, TopologyRegistry};

use crate::error::Result;
use crate::ldap::{LdapServerControl, LdapServerHandle};

/// Everything a running suite owns: the consumed topology plus the
/// handles of every LDAP server provisioning started
#[derive(Debug)]
pub struct SuiteContext {
    topology: TopologyRegistry,
    servers: Vec<LdapServerHandle>,
}

/// Start every distinct LDAP endpoint the topology references, primaries
/// first, blocking until each accepts connections.
///
/// Fail-fast: the first endpoint that cannot be started aborts setup, and
/// anything already started is stopped (best-effort) before the error is
/// returned. There is no partial-run policy.
pub async fn provision(
    topology: TopologyRegistry,
    control: &dyn LdapServerControl,
) -> Result<SuiteContext> {
    if topology.is_empty() {
        warn!("provisioning an empty topology; no LDAP servers will be started");
    }

    let endpoints: Vec<ServerEndpoint> = topology.endpoints().into_iter().cloned().collect();
    info!(count = endpoints.len(), "provisioning local LDAP servers");

    let mut servers: Vec<LdapServerHandle> = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        match control.start(&endpoint).await {
            Ok(handle) => servers.push(handle),
            Err(e) => {
                error!(endpoint = %endpoint, error = %e, "LDAP provisioning failed, aborting suite setup");
                stop_all(control, &mut servers).await;
                return Err(e);
            }
        }
    }

    Ok(SuiteContext { topology, servers })
}

/// Stop every handle, logging failures and continuing; returns the
/// number of failed stops
async fn stop_all(control: &dyn LdapServerControl, servers: &mut Vec<LdapServerHandle>) -> usize {
    let mut failures = 0;
    for handle in servers.iter_mut() {
        if let Err(e) = control.stop(handle).await {
            warn!(endpoint = %handle.endpoint, error = %e, "failed to stop LDAP server");
            failures += 1;
        }
    }
    servers.clear();
    failures
}

impl SuiteContext {
    /// The topology this context was provisioned from
    pub fn topology(&self) -> &TopologyRegistry {
        &self.topology
    }

    /// Handles of the started servers, in start order
    pub fn servers(&self) -> &[LdapServerHandle] {
        &self.servers
    }

    /// Stop every started server.
    ///
    /// Best-effort: a failing stop is logged and the remaining servers are
    /// still attempted. Returns the number of failures rather than an
    /// error so teardown never aborts mid-way.
    pub async fn teardown(mut self, control: &dyn LdapServerControl) -> usize {
        info!(count = self.servers.len(), "tearing down suite LDAP servers");
        let failures = stop_all(control, &mut self.servers).await;
        if failures > 0 {
            warn!(failures, "suite teardown finished with failures");
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::HarnessError;

    /// Recording fake: starts succeed unless the endpoint name is listed,
    /// stops likewise
    #[derive(Default)]
    struct FakeControl {
        started: Mutex<Vec<String>>,
        stopped: Mutex<Vec<String>>,
        fail_start: Vec<String>,
        fail_stop: Vec<String>,
    }

    #[async_trait]
    impl LdapServerControl for FakeControl {
        async fn start(&self, endpoint: &ServerEndpoint) -> Result<LdapServerHandle> {
            if self.fail_start.contains(&endpoint.name) {
                return Err(HarnessError::provisioning(format!("{endpoint} refused")));
            }
            self.started.lock().unwrap().push(endpoint.name.clone());
            Ok(LdapServerHandle::external(endpoint.clone()))
        }

        async fn stop(&self, handle: &mut LdapServerHandle) -> Result<()> {
            if self.fail_stop.contains(&handle.endpoint.name) {
                return Err(HarnessError::provisioning(format!(
                    "{} stuck",
                    handle.endpoint
                )));
            }
            self.stopped.lock().unwrap().push(handle.endpoint.name.clone());
            Ok(())
        }
    }

    fn ep(name: &str, port: u16) -> ServerEndpoint {
        ServerEndpoint::new(name, port)
    }

    fn pair_topology() -> TopologyRegistry {
        let mut topology = TopologyRegistry::new();
        topology
            .register(ep("ldap1", 10389), ep("ldap4", 10389))
            .register(ep("ldap2", 10389), ep("ldap5", 10389));
        topology
    }

    #[tokio::test]
    async fn test_provision_starts_every_distinct_endpoint() {
        let control = FakeControl::default();
        let context = provision(pair_topology(), &control).await.unwrap();

        assert_eq!(
            *control.started.lock().unwrap(),
            vec!["ldap1", "ldap2", "ldap4", "ldap5"]
        );
        assert_eq!(context.servers().len(), 4);
        assert_eq!(context.topology().mapping_count(), 2);
    }

    #[tokio::test]
    async fn test_provision_failure_is_fatal_and_cleans_up() {
        let control = FakeControl {
            fail_start: vec!["ldap4".to_string()],
            ..FakeControl::default()
        };
        let err = provision(pair_topology(), &control).await.unwrap_err();
        assert!(matches!(err, HarnessError::Provisioning(_)));

        // Both primaries were started before the failure; both were
        // stopped again before the error surfaced
        assert_eq!(*control.started.lock().unwrap(), vec!["ldap1", "ldap2"]);
        assert_eq!(*control.stopped.lock().unwrap(), vec!["ldap1", "ldap2"]);
    }

    #[tokio::test]
    async fn test_teardown_continues_past_failures() {
        let control = FakeControl {
            fail_stop: vec!["ldap2".to_string()],
            ..FakeControl::default()
        };
        let context = provision(pair_topology(), &control).await.unwrap();

        let failures = context.teardown(&control).await;
        assert_eq!(failures, 1);
        // The failing stop did not prevent the later ones
        assert_eq!(
            *control.stopped.lock().unwrap(),
            vec!["ldap1", "ldap4", "ldap5"]
        );
    }

    #[tokio::test]
    async fn test_empty_topology_provisions_nothing() {
        let control = FakeControl::default();
        let context = provision(TopologyRegistry::new(), &control).await.unwrap();
        assert!(context.servers().is_empty());
        assert_eq!(context.teardown(&control).await, 0);
    }
}
