use serde::{Deserialize, Serialize};

/// Non-secret git access configuration kept on a migrated project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCredentials {
    pub remote_url: String,
    #[serde(default)]
    pub user: String,
    pub auth: GitAuth,
}

/// Transport-specific auth configuration, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GitAuth {
    Https(HttpsGitAuth),
    /// A remote whose transport the legacy shape cannot describe (SSH,
    /// scp-style, file). `scheme` is empty when none could be inferred.
    Unclassified { scheme: String },
}

impl GitAuth {
    #[must_use]
    pub fn as_https(&self) -> Option<&HttpsGitAuth> {
        match self {
            GitAuth::Https(https) => Some(https),
            GitAuth::Unclassified { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpsGitAuth {
    pub insecure_skip_tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyGitAuth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyGitAuth {
    pub scheme: String,
    pub url: String,
    #[serde(default)]
    pub user: String,
}

/// Secret-store payload for a project's git credentials.
///
/// Borrows from the legacy record so secret values are copied only once,
/// into the serialized buffer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCredentialSecret<'a> {
    #[serde(rename = "remoteURL")]
    pub remote_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https: Option<HttpsGitSecret<'a>>,
    /// Proxy of a remote that is not HTTP(S); HTTP(S) remotes carry it under `https`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyGitSecret<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsGitSecret<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    #[serde(rename = "insecureSkipTLS")]
    pub insecure_skip_tls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyGitSecret<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyGitSecret<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}
