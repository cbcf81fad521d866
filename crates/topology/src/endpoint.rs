/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! LDAP server endpoints and their identity keys

use std::fmt;

use serde::{Deserialize, Serialize};

/// One LDAP server instance as the suites address it.
///
/// Immutable once constructed. The name is a logical host identifier, not
/// necessarily a resolvable hostname; ports and names are trusted literals
/// at registration time and are not validated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Logical host identifier
    pub name: String,
    /// LDAP port
    pub port: u16,
    /// Connect over LDAPS
    #[serde(default)]
    pub ssl: bool,
    /// Bind DN for authenticated connections
    #[serde(default)]
    pub bind_dn: Option<String>,
    /// Bind password for authenticated connections
    #[serde(default)]
    pub bind_password: Option<String>,
}

impl ServerEndpoint {
    /// Create a plain (non-SSL, anonymous bind) endpoint
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            ssl: false,
            bind_dn: None,
            bind_password: None,
        }
    }

    /// Create an SSL endpoint with bind credentials
    pub fn with_ssl(
        name: impl Into<String>,
        port: u16,
        bind_dn: impl Into<String>,
        bind_password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            port,
            ssl: true,
            bind_dn: Some(bind_dn.into()),
            bind_password: Some(bind_password.into()),
        }
    }

    /// Identity key of this endpoint (name + port composite)
    pub fn key(&self) -> PrimaryKey {
        PrimaryKey {
            name: self.name.clone(),
            port: self.port,
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssl {
            write!(f, "ldaps://{}:{}", self.name, self.port)
        } else {
            write!(f, "ldap://{}:{}", self.name, self.port)
        }
    }
}

/// Name+port composite identifying a primary server in the registry.
///
/// Two endpoints with the same name and port share a key even when their
/// SSL or credential fields differ; the registry sequences are keyed on
/// reachability identity, not connection settings.
///
/// Serializes as the `name:port` string so it can key TOML/JSON tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKey {
    pub name: String,
    pub port: u16,
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

impl std::str::FromStr for PrimaryKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("missing ':' in primary key '{s}'"))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| format!("bad port in primary key '{s}': {e}"))?;
        Ok(Self {
            name: name.to_string(),
            port,
        })
    }
}

impl Serialize for PrimaryKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrimaryKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_endpoint() {
        let ep = ServerEndpoint::new("ldap1.example.test", 10389);
        assert_eq!(ep.name, "ldap1.example.test");
        assert_eq!(ep.port, 10389);
        assert!(!ep.ssl);
        assert!(ep.bind_dn.is_none());
        assert_eq!(ep.to_string(), "ldap://ldap1.example.test:10389");
    }

    #[test]
    fn test_ssl_endpoint() {
        let ep = ServerEndpoint::with_ssl("ldap1.example.test", 10636, "cn=root", "secret");
        assert!(ep.ssl);
        assert_eq!(ep.bind_dn.as_deref(), Some("cn=root"));
        assert_eq!(ep.bind_password.as_deref(), Some("secret"));
        assert_eq!(ep.to_string(), "ldaps://ldap1.example.test:10636");
    }

    #[test]
    fn test_key_string_round_trip() {
        let key = ServerEndpoint::new("ldap1.example.test", 10389).key();
        assert_eq!(key.to_string(), "ldap1.example.test:10389");
        let parsed: PrimaryKey = "ldap1.example.test:10389".parse().unwrap();
        assert_eq!(parsed, key);
        assert!("no-port".parse::<PrimaryKey>().is_err());
        assert!("host:notaport".parse::<PrimaryKey>().is_err());
    }

    #[test]
    fn test_key_serializes_as_string() {
        let key = ServerEndpoint::new("ldap1.example.test", 10389).key();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"ldap1.example.test:10389\"");
        let back: PrimaryKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_key_ignores_connection_settings() {
        let plain = ServerEndpoint::new("ldap1", 10389);
        let ssl = ServerEndpoint::with_ssl("ldap1", 10389, "cn=root", "secret");
        assert_eq!(plain.key(), ssl.key());

        let other_port = ServerEndpoint::new("ldap1", 10390);
        assert_ne!(plain.key(), other_port.key());
    }
}
