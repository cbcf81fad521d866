/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! # Registry Client
//!
//! HTTP connection to the user-registry test servlet deployed on the
//! server under test. Each registry operation is one GET of the servlet
//! with a `method` query parameter plus named operation parameters; the
//! servlet answers in plain text:
//!
//! - a bare value (realm name, security name, `true`/`false`)
//! - the literal `null` where the registry returned nothing
//! - `Exception: <text>` when the registry call threw on the server side
//! - for searches, a `hasMore=<bool>` line followed by one entry per line
//!
//! The client only reads back what the server observed; it implements no
//! LDAP or authentication logic of its own.

use tracing::debug;

use fat_harness::{RetryOutcome, RetryPolicy};

/// Result type for registry servlet calls
pub type Result<T> = std::result::Result<T, ClientError>;

/// Servlet connection errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry call threw on the server side
    #[error("Registry error: {0}")]
    Registry(String),

    /// The servlet answered something outside the wire contract
    #[error("Unexpected response: {0}")]
    Protocol(String),
}

/// Page of a user or group search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Matched security names, in registry order
    pub entries: Vec<String>,
    /// True when the registry had more matches than the requested limit
    pub has_more: bool,
}

const SERVLET_PATH: &str = "/userRegistry";
const NULL_LITERAL: &str = "null";
const EXCEPTION_PREFIX: &str = "Exception: ";

/// Connection to the user-registry servlet on one server instance
#[derive(Debug, Clone)]
pub struct RegistryServletConnection {
    base_url: String,
    http: reqwest::Client,
}

impl RegistryServletConnection {
    /// Connect to the servlet on `host:port` (plain HTTP)
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_base_url(format!("http://{host}:{port}"))
    }

    /// Connect to the servlet under an explicit base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Invoke one servlet method and return the raw (trimmed) body
    async fn invoke(&self, method: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut query: Vec<(&str, &str)> = vec![("method", method)];
        query.extend_from_slice(params);

        debug!(method, "invoking registry servlet");
        let response = self
            .http
            .get(format!("{}{}", self.base_url, SERVLET_PATH))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Protocol(format!(
                "servlet answered {status} to {method}"
            )));
        }

        let body = body.trim().to_string();
        if let Some(text) = body.strip_prefix(EXCEPTION_PREFIX) {
            return Err(ClientError::Registry(text.to_string()));
        }
        Ok(body)
    }

    /// Invoke a method whose answer may be `null`
    async fn invoke_optional(&self, method: &str, params: &[(&str, &str)]) -> Result<Option<String>> {
        let body = self.invoke(method, params).await?;
        Ok((body != NULL_LITERAL).then_some(body))
    }

    /// Invoke a method answering `true`/`false`
    async fn invoke_bool(&self, method: &str, params: &[(&str, &str)]) -> Result<bool> {
        let body = self.invoke(method, params).await?;
        body.parse()
            .map_err(|_| ClientError::Protocol(format!("{method} answered '{body}', expected a boolean")))
    }

    /// Invoke a search method answering `hasMore=<bool>` plus entries
    async fn invoke_search(&self, method: &str, params: &[(&str, &str)]) -> Result<SearchResult> {
        let body = self.invoke(method, params).await?;
        let mut lines = body.lines();
        let header = lines.next().unwrap_or_default();
        let has_more = header
            .strip_prefix("hasMore=")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                ClientError::Protocol(format!("{method} answered '{header}', expected hasMore=<bool>"))
            })?;
        Ok(SearchResult {
            entries: lines.map(str::to_string).collect(),
            has_more,
        })
    }

    /// Invoke a method answering zero or more entries, one per line;
    /// `null` means no entries
    async fn invoke_list(&self, method: &str, params: &[(&str, &str)]) -> Result<Vec<String>> {
        let body = self.invoke(method, params).await?;
        if body == NULL_LITERAL {
            return Ok(Vec::new());
        }
        Ok(body.lines().map(str::to_string).collect())
    }

    /// The realm name the registry reports, or `None` right after startup
    pub async fn get_realm(&self) -> Result<Option<String>> {
        self.invoke_optional("getRealm", &[]).await
    }

    /// Bounded recheck for the realm: right after server start the realm
    /// can still be `null`, so poll until it appears or the budget runs out
    pub async fn wait_for_realm(&self, policy: &RetryPolicy) -> Result<RetryOutcome<String>> {
        policy.poll_until_async(|| self.get_realm()).await
    }

    /// Authenticate a user; the authenticated security name, or `None`
    /// when the credentials were rejected
    pub async fn check_password(&self, user: &str, password: &str) -> Result<Option<String>> {
        self.invoke_optional("checkPassword", &[("user", user), ("password", password)])
            .await
    }

    /// True when the security name exists as a user
    pub async fn is_valid_user(&self, user: &str) -> Result<bool> {
        self.invoke_bool("isValidUser", &[("user", user)]).await
    }

    /// Search users by pattern, up to `limit` entries
    pub async fn get_users(&self, pattern: &str, limit: u32) -> Result<SearchResult> {
        self.invoke_search("getUsers", &[("pattern", pattern), ("limit", &limit.to_string())])
            .await
    }

    /// Display name for a user security name
    pub async fn get_user_display_name(&self, user: &str) -> Result<Option<String>> {
        self.invoke_optional("getUserDisplayName", &[("user", user)]).await
    }

    /// Unique id for a user security name
    pub async fn get_unique_user_id(&self, user: &str) -> Result<Option<String>> {
        self.invoke_optional("getUniqueUserId", &[("user", user)]).await
    }

    /// Security name for a unique user id
    pub async fn get_user_security_name(&self, unique_id: &str) -> Result<Option<String>> {
        self.invoke_optional("getUserSecurityName", &[("uniqueId", unique_id)]).await
    }

    /// True when the security name exists as a group
    pub async fn is_valid_group(&self, group: &str) -> Result<bool> {
        self.invoke_bool("isValidGroup", &[("group", group)]).await
    }

    /// Search groups by pattern, up to `limit` entries
    pub async fn get_groups(&self, pattern: &str, limit: u32) -> Result<SearchResult> {
        self.invoke_search("getGroups", &[("pattern", pattern), ("limit", &limit.to_string())])
            .await
    }

    /// Display name for a group security name
    pub async fn get_group_display_name(&self, group: &str) -> Result<Option<String>> {
        self.invoke_optional("getGroupDisplayName", &[("group", group)]).await
    }

    /// Unique id for a group security name
    pub async fn get_unique_group_id(&self, group: &str) -> Result<Option<String>> {
        self.invoke_optional("getUniqueGroupId", &[("group", group)]).await
    }

    /// Security name for a unique group id
    pub async fn get_group_security_name(&self, unique_id: &str) -> Result<Option<String>> {
        self.invoke_optional("getGroupSecurityName", &[("uniqueId", unique_id)]).await
    }

    /// Groups the user is a member of, by security name
    pub async fn get_groups_for_user(&self, user: &str) -> Result<Vec<String>> {
        self.invoke_list("getGroupsForUser", &[("user", user)]).await
    }

    /// Groups the user is a member of, by unique id
    pub async fn get_unique_group_ids_for_user(&self, unique_user_id: &str) -> Result<Vec<String>> {
        self.invoke_list("getUniqueGroupIdsForUser", &[("uniqueId", unique_user_id)])
            .await
    }
}
