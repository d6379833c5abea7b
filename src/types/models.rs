use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GitCredentials;

/// Project fields that are unrelated to git access and survive migration verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_context: Option<Value>,
    pub shipyard: String,
    pub shipyard_version: String,
    pub stages: Vec<Value>,
}

/// A project record in the legacy shape, with git access configuration
/// (secrets included) stored inline.
#[derive(Clone, Default, PartialEq)]
pub struct LegacyProject {
    pub name: String,
    pub metadata: ProjectMetadata,
    pub git_remote_url: Option<String>,
    pub git_user: Option<String>,
    pub git_token: Option<String>,
    pub git_proxy_url: Option<String>,
    pub git_proxy_scheme: Option<String>,
    pub git_proxy_user: Option<String>,
    pub git_proxy_password: Option<String>,
    pub insecure_skip_tls: bool,
}

impl LegacyProject {
    /// Returns the remote URL when legacy credentials are present.
    ///
    /// An empty remote URL is treated the same as a missing one.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        non_empty(&self.git_remote_url)
    }

    #[must_use]
    pub fn has_legacy_credentials(&self) -> bool {
        self.remote_url().is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        non_empty(&self.git_user)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        non_empty(&self.git_token)
    }

    #[must_use]
    pub fn proxy_url(&self) -> Option<&str> {
        non_empty(&self.git_proxy_url)
    }

    #[must_use]
    pub fn proxy_scheme(&self) -> Option<&str> {
        non_empty(&self.git_proxy_scheme)
    }

    #[must_use]
    pub fn proxy_user(&self) -> Option<&str> {
        non_empty(&self.git_proxy_user)
    }

    #[must_use]
    pub fn proxy_password(&self) -> Option<&str> {
        non_empty(&self.git_proxy_password)
    }
}

impl fmt::Debug for LegacyProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyProject")
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .field("git_remote_url", &self.git_remote_url)
            .field("git_user", &self.git_user)
            .field("git_token", &redacted(&self.git_token))
            .field("git_proxy_url", &self.git_proxy_url)
            .field("git_proxy_scheme", &self.git_proxy_scheme)
            .field("git_proxy_user", &self.git_proxy_user)
            .field("git_proxy_password", &redacted(&self.git_proxy_password))
            .field("insecure_skip_tls", &self.insecure_skip_tls)
            .finish()
    }
}

/// A project record in the secure shape. Holds no secret material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(flatten)]
    pub metadata: ProjectMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_credentials: Option<GitCredentials>,
}

/// A project row exactly as the project store holds it: legacy inline columns
/// plus the secure credentials column.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProject {
    pub legacy: LegacyProject,
    pub git_credentials: Option<GitCredentials>,
}

impl StoredProject {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.legacy.name
    }

    /// True while any legacy credential column still carries data.
    #[must_use]
    pub fn has_legacy_fields(&self) -> bool {
        let l = &self.legacy;
        l.git_remote_url.is_some()
            || l.git_user.is_some()
            || l.git_token.is_some()
            || l.git_proxy_url.is_some()
            || l.git_proxy_scheme.is_some()
            || l.git_proxy_user.is_some()
            || l.git_proxy_password.is_some()
            || l.insecure_skip_tls
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[REDACTED]")
}
