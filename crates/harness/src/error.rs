/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Error types for the FAT harness

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Harness errors
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// LDAP provisioning error
    #[error("Provisioning error: {0}")]
    Provisioning(String),

    /// Application server error
    #[error("Server error: {0}")]
    Server(String),

    /// Bounded wait exhausted
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl HarnessError {
    /// Create a new configuration error
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new provisioning error
    pub fn provisioning<T: Into<String>>(msg: T) -> Self {
        Self::Provisioning(msg.into())
    }

    /// Create a new server error
    pub fn server<T: Into<String>>(msg: T) -> Self {
        Self::Server(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<T: Into<String>>(msg: T) -> Self {
        Self::Timeout(msg.into())
    }

    /// True when the error aborts suite setup rather than a single test.
    ///
    /// Every provisioning or readiness failure is fatal to the suite
    /// (fail-fast, no partial run); teardown failures are reported but
    /// never raised through this type.
    pub fn is_fatal_to_suite(&self) -> bool {
        matches!(
            self,
            Self::Provisioning(_) | Self::Timeout(_) | Self::Server(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HarnessError::provisioning("ldap1:10389 did not come up");
        assert!(matches!(err, HarnessError::Provisioning(_)));
        assert_eq!(
            err.to_string(),
            "Provisioning error: ldap1:10389 did not come up"
        );
    }

    #[test]
    fn test_suite_fatality() {
        assert!(HarnessError::provisioning("x").is_fatal_to_suite());
        assert!(HarnessError::timeout("x").is_fatal_to_suite());
        assert!(HarnessError::server("x").is_fatal_to_suite());
        assert!(!HarnessError::config("x").is_fatal_to_suite());
    }
}
