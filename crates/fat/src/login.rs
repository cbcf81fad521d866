/*!
 * Login Suite
 *
 * Credential checks through the registry servlet: a valid login answers
 * the authenticated security name, a bad password or unknown principal
 * answers null, never an error.
 *
 * Author: LDAP Registry FAT Team
 * Created: 2026-08-20
 */

use tracing::info;

use registry_client::RegistryServletConnection;

use crate::results::{run_case, SuiteSummary, TestOutcome};
use crate::FatSettings;

/// Credential-check suite
pub struct LoginSuite<'a> {
    servlet: &'a RegistryServletConnection,
    settings: &'a FatSettings,
}

impl<'a> LoginSuite<'a> {
    /// Create the suite against an already started server
    pub fn new(servlet: &'a RegistryServletConnection, settings: &'a FatSettings) -> Self {
        Self { servlet, settings }
    }

    /// Run every login case
    pub async fn run(&self) -> SuiteSummary {
        info!("running login suite");
        let outcomes = vec![
            self.valid_credentials_accepted().await,
            self.invalid_password_rejected().await,
            self.unknown_user_rejected().await,
            self.test_user_is_valid().await,
        ];
        SuiteSummary::from_outcomes("login", outcomes)
    }

    async fn valid_credentials_accepted(&self) -> TestOutcome {
        run_case("login.valid_credentials_accepted", || async {
            let name = self
                .servlet
                .check_password(&self.settings.test_user, &self.settings.test_password)
                .await
                .map_err(|e| e.to_string())?;
            match name {
                Some(name) if name == self.settings.test_user => Ok(()),
                Some(name) => Err(format!(
                    "authenticated as '{name}', expected '{}'",
                    self.settings.test_user
                )),
                None => Err("valid credentials were rejected".to_string()),
            }
        })
        .await
    }

    async fn invalid_password_rejected(&self) -> TestOutcome {
        run_case("login.invalid_password_rejected", || async {
            let name = self
                .servlet
                .check_password(&self.settings.test_user, &self.settings.invalid_password)
                .await
                .map_err(|e| e.to_string())?;
            match name {
                None => Ok(()),
                Some(name) => Err(format!("bad password authenticated as '{name}'")),
            }
        })
        .await
    }

    async fn unknown_user_rejected(&self) -> TestOutcome {
        run_case("login.unknown_user_rejected", || async {
            let name = self
                .servlet
                .check_password("nosuchuser", &self.settings.test_password)
                .await
                .map_err(|e| e.to_string())?;
            match name {
                None => Ok(()),
                Some(name) => Err(format!("unknown user authenticated as '{name}'")),
            }
        })
        .await
    }

    async fn test_user_is_valid(&self) -> TestOutcome {
        run_case("login.test_user_is_valid", || async {
            let valid = self
                .servlet
                .is_valid_user(&self.settings.test_user)
                .await
                .map_err(|e| e.to_string())?;
            if valid {
                Ok(())
            } else {
                Err(format!("'{}' not known to the registry", self.settings.test_user))
            }
        })
        .await
    }
}
