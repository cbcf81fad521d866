/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Harness configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HarnessError, Result};
use crate::ldap::LdapLaunchConfig;
use crate::retry::RetryPolicy;
use crate::server::ServerConfig;

/// Top-level harness configuration, loadable from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Application server under test
    #[serde(default)]
    pub server: ServerConfig,
    /// Local LDAP launcher
    #[serde(default)]
    pub ldap: LdapLaunchConfig,
    /// Readiness wait timings
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Readiness wait timings in config-friendly units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total wait budget in seconds
    pub ready_timeout_secs: u64,
    /// Pause between polls in milliseconds
    pub poll_interval_millis: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            ready_timeout_secs: 120,
            poll_interval_millis: 1000,
        }
    }
}

impl RetrySettings {
    /// The retry policy these settings describe
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.ready_timeout_secs),
            Duration::from_millis(self.poll_interval_millis),
        )
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading harness configuration");
        let content = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::config(format!("failed to read {}: {e}", path.display())))?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HarnessError::config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
