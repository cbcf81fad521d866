/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Local LDAP server provisioning
//!
//! The provisioning routine consumes a failover topology and starts one
//! local LDAP process per distinct endpoint. The control trait is the seam
//! between topology walking and process management, so suites can run
//! against a recording fake while the runner uses real processes.

use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use ldap_topology::ServerEndpoint;

use crate::error::{HarnessError, Result};
use crate::retry::{RetryOutcome, RetryPolicy};

/// Handle to one started (or externally managed) LDAP server
#[derive(Debug)]
pub struct LdapServerHandle {
    /// The endpoint this handle serves
    pub endpoint: ServerEndpoint,
    process: Option<Child>,
}

impl LdapServerHandle {
    /// Handle for a server this harness spawned
    pub fn spawned(endpoint: ServerEndpoint, process: Child) -> Self {
        Self {
            endpoint,
            process: Some(process),
        }
    }

    /// Handle for a server something else manages (already running)
    pub fn external(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            process: None,
        }
    }

    /// The child process, if this harness owns one
    pub fn process_mut(&mut self) -> Option<&mut Child> {
        self.process.as_mut()
    }
}

/// Start/stop seam between the provisioning routine and LDAP processes
#[async_trait]
pub trait LdapServerControl: Send + Sync {
    /// Start (or verify already running) the server for an endpoint and
    /// block until it accepts connections
    async fn start(&self, endpoint: &ServerEndpoint) -> Result<LdapServerHandle>;

    /// Stop a started server
    async fn stop(&self, handle: &mut LdapServerHandle) -> Result<()>;
}

/// Launcher settings for local LDAP server processes.
///
/// `{name}` and `{port}` placeholders in the arguments are substituted per
/// endpoint before spawning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapLaunchConfig {
    /// Launcher command
    pub command: String,
    /// Launcher arguments, with per-endpoint placeholders
    pub args: Vec<String>,
    /// Working directory for the launcher
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl Default for LdapLaunchConfig {
    fn default() -> Self {
        Self {
            command: "./ldap/bin/start-instance".to_string(),
            args: vec![
                "--instance".to_string(),
                "{name}".to_string(),
                "--port".to_string(),
                "{port}".to_string(),
            ],
            work_dir: None,
        }
    }
}

impl LdapLaunchConfig {
    /// Arguments with the endpoint's placeholders substituted
    pub fn render_args(&self, endpoint: &ServerEndpoint) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{name}", &endpoint.name)
                    .replace("{port}", &endpoint.port.to_string())
            })
            .collect()
    }
}

/// Process-spawning control: launches one child per endpoint and polls the
/// port until it accepts TCP connections
#[derive(Debug)]
pub struct ProcessLdapControl {
    launcher: LdapLaunchConfig,
    policy: RetryPolicy,
}

impl ProcessLdapControl {
    /// Create a control with the given launcher and readiness budget
    pub fn new(launcher: LdapLaunchConfig, policy: RetryPolicy) -> Self {
        Self { launcher, policy }
    }

    fn probe_addr(endpoint: &ServerEndpoint) -> SocketAddr {
        // Local instances listen on loopback regardless of logical name
        SocketAddr::from(([127, 0, 0, 1], endpoint.port))
    }
}

#[async_trait]
impl LdapServerControl for ProcessLdapControl {
    async fn start(&self, endpoint: &ServerEndpoint) -> Result<LdapServerHandle> {
        let args = self.launcher.render_args(endpoint);
        info!(endpoint = %endpoint, command = %self.launcher.command, "launching LDAP server");

        let mut command = Command::new(&self.launcher.command);
        command.args(&args);
        if let Some(dir) = &self.launcher.work_dir {
            command.current_dir(dir);
        }
        let child = command.spawn().map_err(|e| {
            HarnessError::provisioning(format!(
                "failed to launch LDAP server for {endpoint}: {e}"
            ))
        })?;

        let addr = Self::probe_addr(endpoint);
        let connect_timeout = self.policy.interval.min(Duration::from_secs(1));
        let outcome = self
            .policy
            .poll_until(|| {
                debug!(%addr, "probing LDAP port");
                Ok::<_, HarnessError>(
                    TcpStream::connect_timeout(&addr, connect_timeout)
                        .is_ok()
                        .then_some(()),
                )
            })
            .await?;

        match outcome {
            RetryOutcome::Ready(()) => {
                info!(endpoint = %endpoint, "LDAP server accepting connections");
                Ok(LdapServerHandle::spawned(endpoint.clone(), child))
            }
            RetryOutcome::TimedOut { attempts, elapsed } => Err(HarnessError::timeout(format!(
                "LDAP server {endpoint} not reachable after {attempts} probes over {elapsed:?}"
            ))),
        }
    }

    async fn stop(&self, handle: &mut LdapServerHandle) -> Result<()> {
        let endpoint = handle.endpoint.clone();
        let Some(child) = handle.process_mut() else {
            debug!(%endpoint, "externally managed, nothing to stop");
            return Ok(());
        };
        child.start_kill().map_err(|e| {
            HarnessError::provisioning(format!("failed to signal LDAP server {endpoint}: {e}"))
        })?;
        child.wait().await?;
        info!(%endpoint, "LDAP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_args_substitutes_placeholders() {
        let launcher = LdapLaunchConfig::default();
        let endpoint = ServerEndpoint::new("ldap1.fat.local", 10389);
        assert_eq!(
            launcher.render_args(&endpoint),
            vec!["--instance", "ldap1.fat.local", "--port", "10389"]
        );
    }

    #[test]
    fn test_render_args_without_placeholders() {
        let launcher = LdapLaunchConfig {
            command: "in-memory-ldap".to_string(),
            args: vec!["--foreground".to_string()],
            work_dir: None,
        };
        let endpoint = ServerEndpoint::new("ldap1", 10389);
        assert_eq!(launcher.render_args(&endpoint), vec!["--foreground"]);
    }

    #[tokio::test]
    async fn test_start_against_listening_port() {
        // Stand in for a started LDAP process with a plain TCP listener
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let launcher = LdapLaunchConfig {
            command: "true".to_string(),
            args: Vec::new(),
            work_dir: None,
        };
        let control = ProcessLdapControl::new(
            launcher,
            RetryPolicy::new(Duration::from_secs(2), Duration::from_millis(50)),
        );

        let endpoint = ServerEndpoint::new("localhost", port);
        let mut handle = control.start(&endpoint).await.unwrap();
        assert_eq!(handle.endpoint, endpoint);
        control.stop(&mut handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_unreachable_port_times_out() {
        // Nothing listens here; the bounded probe must exhaust and fail
        let launcher = LdapLaunchConfig {
            command: "true".to_string(),
            args: Vec::new(),
            work_dir: None,
        };
        let control = ProcessLdapControl::new(
            launcher,
            RetryPolicy::new(Duration::from_millis(200), Duration::from_millis(50)),
        );

        let endpoint = ServerEndpoint::new("localhost", 1);
        let err = control.start(&endpoint).await.unwrap_err();
        assert!(matches!(err, HarnessError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_stop_kills_spawned_process() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        // A long-lived child standing in for a running LDAP process
        let launcher = LdapLaunchConfig {
            command: "sleep".to_string(),
            args: vec!["30".to_string()],
            work_dir: None,
        };
        let control = ProcessLdapControl::new(
            launcher,
            RetryPolicy::new(Duration::from_secs(2), Duration::from_millis(50)),
        );

        let endpoint = ServerEndpoint::new("localhost", port);
        let mut handle = control.start(&endpoint).await.unwrap();
        assert!(handle.process_mut().is_some());
        control.stop(&mut handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_external_handle_is_noop() {
        let control = ProcessLdapControl::new(LdapLaunchConfig::default(), RetryPolicy::default());
        let mut handle = LdapServerHandle::external(ServerEndpoint::new("remote", 389));
        control.stop(&mut handle).await.unwrap();
    }
}
