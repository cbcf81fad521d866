/*!
 * LDAP User-Registry FAT Suites
 *
 * Acceptance tests for an application server's LDAP-backed user registry,
 * including:
 *
 * - Realm name reporting through the registry servlet
 * - Credential checking (valid, invalid and unknown principals)
 * - User and group lookup, search limits and group membership
 * - The shared primary/failover LDAP topology every suite provisions
 *
 * Each suite drives the server purely from the outside: start it, wait on
 * its readiness markers, call the registry servlet over HTTP and assert on
 * the observed responses. Nothing here implements registry semantics.
 *
 * Author: LDAP Registry FAT Team
 * Created: 2026-08-20
 * License: AGPL-3.0-only
 */

use serde::{Deserialize, Serialize};

pub mod login;
pub mod membership;
pub mod realm;
pub mod results;
pub mod topology;

pub use results::{run_case, SuiteSummary, TestOutcome};
pub use topology::{bootstrap_vars, suite_topology};

/// Fixture data the suites assert against: the directory behind the
/// registry is expected to contain these entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FatSettings {
    /// Realm name the registry must report
    pub expected_realm: String,
    /// A user present in the directory
    pub test_user: String,
    /// That user's password
    pub test_password: String,
    /// A password the directory must reject
    pub invalid_password: String,
    /// A group the test user belongs to
    pub test_group: String,
    /// Search limit used by the lookup cases
    pub search_limit: u32,
}

impl Default for FatSettings {
    fn default() -> Self {
        Self {
            expected_realm: "SampleLdapIDSRealm".to_string(),
            test_user: "vmmtestuser".to_string(),
            test_password: "vmmtestuserpwd".to_string(),
            invalid_password: "badPassword".to_string(),
            test_group: "vmmgroup1".to_string(),
            search_limit: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = FatSettings::default();
        assert_eq!(settings.expected_realm, "SampleLdapIDSRealm");
        assert_ne!(settings.test_password, settings.invalid_password);
    }

    #[test]
    fn test_settings_toml_round_trip() {
        let settings = FatSettings::default();
        let encoded = toml::to_string(&settings).unwrap();
        let decoded: FatSettings = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.test_user, settings.test_user);
    }
}
