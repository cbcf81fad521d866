/*!
 * Realm Suite
 *
 * Verifies the registry reports the expected realm name, the first
 * observable proof that the registry wired itself to the directory at all.
 *
 * Author: LDAP Registry FAT Team
 * Created: 2026-08-20
 */

use std::time::Duration;

use tracing::info;

use fat_harness::RetryPolicy;
use registry_client::RegistryServletConnection;

use crate::results::{run_case, SuiteSummary, TestOutcome};
use crate::FatSettings;

/// Realm reporting suite
pub struct RealmSuite<'a> {
    servlet: &'a RegistryServletConnection,
    settings: &'a FatSettings,
}

impl<'a> RealmSuite<'a> {
    /// Create the suite against an already started server
    pub fn new(servlet: &'a RegistryServletConnection, settings: &'a FatSettings) -> Self {
        Self { servlet, settings }
    }

    /// Run every realm case
    pub async fn run(&self) -> SuiteSummary {
        info!("running realm suite");
        let outcomes = vec![
            self.expected_realm_reported().await,
            self.realm_stable_across_lookups().await,
        ];
        SuiteSummary::from_outcomes("realm", outcomes)
    }

    /// The registry must report the configured realm, allowing for the
    /// short window right after startup where it is still null
    async fn expected_realm_reported(&self) -> TestOutcome {
        run_case("realm.expected_realm_reported", || async {
            let policy = RetryPolicy::new(Duration::from_secs(10), Duration::from_millis(250));
            let outcome = self
                .servlet
                .wait_for_realm(&policy)
                .await
                .map_err(|e| e.to_string())?;
            let realm = outcome
                .into_ready()
                .ok_or_else(|| "realm still null after bounded recheck".to_string())?;
            if realm == self.settings.expected_realm {
                Ok(())
            } else {
                Err(format!(
                    "expected realm '{}', got '{realm}'",
                    self.settings.expected_realm
                ))
            }
        })
        .await
    }

    /// Two consecutive lookups must agree
    async fn realm_stable_across_lookups(&self) -> TestOutcome {
        run_case("realm.stable_across_lookups", || async {
            let first = self.servlet.get_realm().await.map_err(|e| e.to_string())?;
            let second = self.servlet.get_realm().await.map_err(|e| e.to_string())?;
            if first == second {
                Ok(())
            } else {
                Err(format!("realm changed between lookups: {first:?} then {second:?}"))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_realm(server: &MockServer, realm: &str) {
        Mock::given(method("GET"))
            .and(path("/userRegistry"))
            .and(query_param("method", "getRealm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(realm))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_suite_passes_against_expected_realm() {
        let server = MockServer::start().await;
        mount_realm(&server, "SampleLdapIDSRealm").await;

        let servlet = RegistryServletConnection::with_base_url(server.uri());
        let settings = FatSettings::default();
        let summary = RealmSuite::new(&servlet, &settings).run().await;
        assert!(summary.all_passed(), "failures: {:?}", summary.failures().collect::<Vec<_>>());
        assert_eq!(summary.total, 2);
    }

    #[tokio::test]
    async fn test_wrong_realm_is_recorded_as_failure() {
        let server = MockServer::start().await;
        mount_realm(&server, "SomeOtherRealm").await;

        let servlet = RegistryServletConnection::with_base_url(server.uri());
        let settings = FatSettings::default();
        let summary = RealmSuite::new(&servlet, &settings).run().await;

        assert_eq!(summary.failed, 1);
        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.name, "realm.expected_realm_reported");
        assert!(failure.error.as_ref().unwrap().contains("SomeOtherRealm"));
    }
}
