/*!
 * Membership Suite
 *
 * User/group lookup and group membership through the registry servlet:
 * search by pattern, unique-id round trips and the groups reported for
 * the test user.
 *
 * Author: LDAP Registry FAT Team
 * Created: 2026-08-20
 */

use tracing::info;

use registry_client::RegistryServletConnection;

use crate::results::{run_case, SuiteSummary, TestOutcome};
use crate::FatSettings;

/// User/group lookup and membership suite
pub struct MembershipSuite<'a> {
    servlet: &'a RegistryServletConnection,
    settings: &'a FatSettings,
}

impl<'a> MembershipSuite<'a> {
    /// Create the suite against an already started server
    pub fn new(servlet: &'a RegistryServletConnection, settings: &'a FatSettings) -> Self {
        Self { servlet, settings }
    }

    /// Run every membership case
    pub async fn run(&self) -> SuiteSummary {
        info!("running membership suite");
        let outcomes = vec![
            self.user_found_by_pattern().await,
            self.group_is_valid().await,
            self.group_found_by_pattern().await,
            self.user_belongs_to_group().await,
            self.unique_user_id_round_trip().await,
        ];
        SuiteSummary::from_outcomes("membership", outcomes)
    }

    async fn user_found_by_pattern(&self) -> TestOutcome {
        run_case("membership.user_found_by_pattern", || async {
            let result = self
                .servlet
                .get_users(&self.settings.test_user, self.settings.search_limit)
                .await
                .map_err(|e| e.to_string())?;
            if !result.entries.iter().any(|e| e == &self.settings.test_user) {
                return Err(format!(
                    "'{}' not in search result {:?}",
                    self.settings.test_user, result.entries
                ));
            }
            if result.has_more {
                return Err("exact-name search reported more matches".to_string());
            }
            Ok(())
        })
        .await
    }

    async fn group_is_valid(&self) -> TestOutcome {
        run_case("membership.group_is_valid", || async {
            let valid = self
                .servlet
                .is_valid_group(&self.settings.test_group)
                .await
                .map_err(|e| e.to_string())?;
            if valid {
                Ok(())
            } else {
                Err(format!("'{}' not known to the registry", self.settings.test_group))
            }
        })
        .await
    }

    async fn group_found_by_pattern(&self) -> TestOutcome {
        run_case("membership.group_found_by_pattern", || async {
            let result = self
                .servlet
                .get_groups(&self.settings.test_group, self.settings.search_limit)
                .await
                .map_err(|e| e.to_string())?;
            if result.entries.iter().any(|e| e == &self.settings.test_group) {
                Ok(())
            } else {
                Err(format!(
                    "'{}' not in search result {:?}",
                    self.settings.test_group, result.entries
                ))
            }
        })
        .await
    }

    async fn user_belongs_to_group(&self) -> TestOutcome {
        run_case("membership.user_belongs_to_group", || async {
            let groups = self
                .servlet
                .get_groups_for_user(&self.settings.test_user)
                .await
                .map_err(|e| e.to_string())?;
            if groups.iter().any(|g| g == &self.settings.test_group) {
                Ok(())
            } else {
                Err(format!(
                    "'{}' not among groups {groups:?} of '{}'",
                    self.settings.test_group, self.settings.test_user
                ))
            }
        })
        .await
    }

    /// Security name → unique id → security name must come back to the
    /// same principal
    async fn unique_user_id_round_trip(&self) -> TestOutcome {
        run_case("membership.unique_user_id_round_trip", || async {
            let unique_id = self
                .servlet
                .get_unique_user_id(&self.settings.test_user)
                .await
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("no unique id for '{}'", self.settings.test_user))?;
            let security_name = self
                .servlet
                .get_user_security_name(&unique_id)
                .await
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("no security name for '{unique_id}'"))?;
            if security_name == self.settings.test_user {
                Ok(())
            } else {
                Err(format!(
                    "round trip through '{unique_id}' came back as '{security_name}'"
                ))
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

    const UNIQUE_ID: &str = "uid=vmmtestuser,o=ibm,c=us";

    async fn mount_directory(server: &MockServer, settings: &FatSettings) {
        let servlet = |name: &str| {
            Mock::given(method("GET"))
                .and(path("/userRegistry"))
                .and(query_param("method", name.to_string()))
        };

        servlet("getUsers")
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("hasMore=false\n{}", settings.test_user)),
            )
            .mount(server)
            .await;
        servlet("isValidGroup")
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .mount(server)
            .await;
        servlet("getGroups")
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("hasMore=false\n{}", settings.test_group)),
            )
            .mount(server)
            .await;
        servlet("getGroupsForUser")
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("{}\nvmmgroup2", settings.test_group)),
            )
            .mount(server)
            .await;
        servlet("getUniqueUserId")
            .respond_with(ResponseTemplate::new(200).set_body_string(UNIQUE_ID))
            .mount(server)
            .await;
        servlet("getUserSecurityName")
            .and(query_param("uniqueId", UNIQUE_ID))
            .respond_with(ResponseTemplate::new(200).set_body_string(settings.test_user.clone()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_suite_against_simulated_directory() {
        let server = MockServer::start().await;
        let settings = FatSettings::default();
        mount_directory(&server, &settings).await;

        let servlet = RegistryServletConnection::with_base_url(server.uri());
        let summary = MembershipSuite::new(&servlet, &settings).run().await;
        assert!(summary.all_passed(), "failures: {:?}", summary.failures().collect::<Vec<_>>());
        assert_eq!(summary.total, 5);
    }

    #[tokio::test]
    async fn test_missing_membership_is_recorded_as_failure() {
        let server = MockServer::start().await;
        let settings = FatSettings::default();
        mount_directory(&server, &settings).await;

        // Override nothing; ask about a user the directory does not map
        // to the expected group
        let other = FatSettings {
            test_group: "missinggroup".to_string(),
            ..settings
        };
        let servlet = RegistryServletConnection::with_base_url(server.uri());
        let summary = MembershipSuite::new(&servlet, &other).run().await;

        let names: Vec<&str> = summary.failures().map(|o| o.name.as_str()).collect();
        assert!(names.contains(&"membership.user_belongs_to_group"));
        assert!(names.contains(&"membership.group_found_by_pattern"));
    }
}
