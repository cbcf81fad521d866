/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Application-server lifecycle control
//!
//! Starts the server under test as a child process, blocks suite setup on
//! its readiness markers, and owns the artifacts (feature manifests,
//! bootstrap properties) written into the install root so teardown can
//! remove them best-effort.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::error::{HarnessError, Result};
use crate::markers::{LogWatcher, APP_STARTED_MARKER, SECURITY_READY_MARKER};
use crate::retry::{RetryOutcome, RetryPolicy};

/// Configuration for one application-server instance under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server (configuration) name
    pub name: String,
    /// Hostname the registry servlet is reached on
    pub hostname: String,
    /// HTTP port the registry servlet is reached on
    pub http_port: u16,
    /// Server install root; features and bootstrap properties land here
    pub install_root: PathBuf,
    /// Console log the readiness markers are polled from
    pub console_log: PathBuf,
    /// Launch command
    pub command: String,
    /// Launch arguments
    pub args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "registry.ldap.fat".to_string(),
            hostname: "localhost".to_string(),
            http_port: 9080,
            install_root: PathBuf::from("./server"),
            console_log: PathBuf::from("./server/logs/console.log"),
            command: "./server/bin/server".to_string(),
            args: vec!["run".to_string(), "registry.ldap.fat".to_string()],
        }
    }
}

/// One application-server instance under test.
///
/// Start blocks until the application-started and security-service-ready
/// markers appear; a marker missing its bounded wait is fatal to suite
/// setup. Stop and artifact removal are best-effort.
#[derive(Debug)]
pub struct ServerInstance {
    config: ServerConfig,
    watcher: LogWatcher,
    process: Option<Child>,
    installed_features: Vec<PathBuf>,
}

impl ServerInstance {
    /// Create a handle for a not-yet-started server
    pub fn new(config: ServerConfig) -> Self {
        let watcher = LogWatcher::new(&config.console_log);
        Self {
            config,
            watcher,
            process: None,
            installed_features: Vec::new(),
        }
    }

    /// The server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Base URL of the HTTP endpoint the registry servlet listens on
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.config.hostname, self.config.http_port)
    }

    /// True while the child process handle is held
    pub fn is_started(&self) -> bool {
        self.process.is_some()
    }

    /// Write bootstrap properties (LDAP host/port variables and friends)
    /// into the install root. Must happen before [`ServerInstance::start`].
    pub fn write_bootstrap_properties(&self, vars: &BTreeMap<String, String>) -> Result<PathBuf> {
        let path = self.config.install_root.join("bootstrap.properties");
        let mut file = std::fs::File::create(&path)?;
        for (key, value) in vars {
            writeln!(file, "{key}={value}")?;
        }
        info!(path = %path.display(), count = vars.len(), "wrote bootstrap properties");
        Ok(path)
    }

    /// Copy a feature manifest into the install root's feature directory,
    /// recording it for teardown removal
    pub fn install_feature(&mut self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| HarnessError::config(format!("feature path has no file name: {}", source.display())))?;
        let features_dir = self.config.install_root.join("lib/features");
        std::fs::create_dir_all(&features_dir)?;
        let target = features_dir.join(file_name);
        std::fs::copy(source, &target)?;
        info!(feature = %target.display(), "installed feature manifest");
        self.installed_features.push(target.clone());
        Ok(target)
    }

    /// Spawn the server and block until it reports ready
    pub async fn start(&mut self, policy: &RetryPolicy) -> Result<()> {
        if self.process.is_some() {
            return Err(HarnessError::server(format!(
                "server '{}' is already started",
                self.config.name
            )));
        }

        info!(server = %self.config.name, command = %self.config.command, "starting server");
        let child = Command::new(&self.config.command)
            .args(&self.config.args)
            .spawn()
            .map_err(|e| {
                HarnessError::server(format!("failed to launch '{}': {e}", self.config.command))
            })?;
        self.process = Some(child);

        // Markers arrive in no fixed relative order; wait on both at once
        let markers = [APP_STARTED_MARKER, SECURITY_READY_MARKER];
        match self.watcher.wait_for_markers(&markers, policy).await? {
            RetryOutcome::Ready(lines) => {
                for line in lines {
                    info!(%line, "readiness marker seen");
                }
            }
            RetryOutcome::TimedOut { attempts, elapsed } => {
                return Err(HarnessError::timeout(format!(
                    "server '{}' never logged all of {markers:?} ({attempts} polls over {elapsed:?})",
                    self.config.name
                )));
            }
        }
        Ok(())
    }

    /// Stop the server process and wait for it to exit
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.process.take() else {
            return Ok(());
        };
        info!(server = %self.config.name, "stopping server");
        child
            .start_kill()
            .map_err(|e| HarnessError::server(format!("failed to signal server: {e}")))?;
        let status = child.wait().await?;
        info!(server = %self.config.name, ?status, "server stopped");
        Ok(())
    }

    /// Remove every feature manifest installed through this instance.
    ///
    /// Best-effort: a failed removal is logged and the rest of the
    /// manifests are still attempted. Returns the number of failures.
    pub fn remove_installed_features(&mut self) -> usize {
        let mut failures = 0;
        for path in self.installed_features.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => info!(feature = %path.display(), "removed feature manifest"),
                Err(e) => {
                    warn!(feature = %path.display(), error = %e, "failed to remove feature manifest");
                    failures += 1;
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(root: &Path) -> ServerConfig {
        ServerConfig {
            install_root: root.to_path_buf(),
            console_log: root.join("logs/console.log"),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_base_url() {
        let server = ServerInstance::new(ServerConfig::default());
        assert_eq!(server.base_url(), "http://localhost:9080");
        assert!(!server.is_started());
    }

    #[test]
    fn test_write_bootstrap_properties() {
        let dir = tempfile::tempdir().unwrap();
        let server = ServerInstance::new(test_config(dir.path()));

        let mut vars = BTreeMap::new();
        vars.insert("ldap.server.1.name".to_string(), "ldap1.fat.local".to_string());
        vars.insert("ldap.server.1.port".to_string(), "10389".to_string());

        let path = server.write_bootstrap_properties(&vars).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            written,
            "ldap.server.1.name=ldap1.fat.local\nldap.server.1.port=10389\n"
        );
    }

    #[test]
    fn test_install_and_remove_feature() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("securitylibertyinternals-1.0.mf");
        std::fs::write(&manifest, "Subsystem-SymbolicName: test").unwrap();

        let mut server = ServerInstance::new(test_config(dir.path()));
        let installed = server.install_feature(&manifest).unwrap();
        assert!(installed.exists());
        assert!(installed.ends_with("lib/features/securitylibertyinternals-1.0.mf"));

        assert_eq!(server.remove_installed_features(), 0);
        assert!(!installed.exists());
    }

    #[test]
    fn test_remove_missing_feature_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("feature.mf");
        std::fs::write(&manifest, "x").unwrap();

        let mut server = ServerInstance::new(test_config(dir.path()));
        let installed = server.install_feature(&manifest).unwrap();
        std::fs::remove_file(&installed).unwrap();

        // Already gone: logged and counted, not raised
        assert_eq!(server.remove_installed_features(), 1);
    }

    #[tokio::test]
    async fn test_start_tolerates_security_marker_logged_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.command = "true".to_string();
        config.args = Vec::new();

        std::fs::create_dir_all(config.console_log.parent().unwrap()).unwrap();
        std::fs::write(
            &config.console_log,
            "CWWKS0008I: The security service is ready.\nCWWKZ0001I: Application userRegistry started.\n",
        )
        .unwrap();

        let mut server = ServerInstance::new(config);
        server
            .start(&RetryPolicy::new(
                std::time::Duration::from_secs(2),
                std::time::Duration::from_millis(20),
            ))
            .await
            .unwrap();
        assert!(server.is_started());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_with_bad_command_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.command = dir.path().join("does-not-exist").display().to_string();

        let mut server = ServerInstance::new(config);
        let err = server
            .start(&RetryPolicy::new(
                std::time::Duration::from_millis(100),
                std::time::Duration::from_millis(10),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Server(_)));
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let mut server = ServerInstance::new(ServerConfig::default());
        server.stop().await.unwrap();
    }
}
