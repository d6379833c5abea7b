//! The secret-store side of the migration.
//!
//! Secret material (git token, proxy password) leaves the project record and
//! lands here as one JSON payload per project, named after the project.

mod sqlite;

pub use sqlite::SqliteSecretStore;

use zeroize::Zeroizing;

use crate::error::Result;
use crate::migration::transform::is_http_remote;
use crate::types::{GitCredentialSecret, HttpsGitSecret, LegacyProject, ProxyGitSecret};

const SECRET_NAME_PREFIX: &str = "git-credentials-";

/// SecretStore holds per-project secret payloads.
pub trait SecretStore: Send + Sync {
    /// Writes the secret material of a legacy record under the project's
    /// identity, replacing any previous entry.
    fn upsert_project_secret(&self, project: &LegacyProject) -> Result<()>;
}

/// Name of the secret entry belonging to a project.
#[must_use]
pub fn secret_name(project: &str) -> String {
    format!("{SECRET_NAME_PREFIX}{project}")
}

/// Builds the secret payload implied by a legacy record's credential shape.
///
/// HTTP(S) remotes keep their token, TLS flag and proxy credentials under
/// `https`. Any other remote keeps its token and proxy at the top level.
#[must_use]
pub fn secret_payload(project: &LegacyProject) -> Option<GitCredentialSecret<'_>> {
    let remote_url = project.remote_url()?;

    let proxy = project.proxy_url().map(|url| ProxyGitSecret {
        url,
        scheme: project.proxy_scheme(),
        user: project.proxy_user(),
        password: project.proxy_password(),
    });

    if !is_http_remote(remote_url) {
        return Some(GitCredentialSecret {
            remote_url,
            user: project.user(),
            token: project.token(),
            https: None,
            proxy,
        });
    }

    Some(GitCredentialSecret {
        remote_url,
        user: project.user(),
        token: None,
        https: Some(HttpsGitSecret {
            token: project.token(),
            insecure_skip_tls: project.insecure_skip_tls,
            proxy,
        }),
        proxy: None,
    })
}

/// Serializes the payload into a buffer that is wiped on drop.
pub(crate) fn encode_payload(project: &LegacyProject) -> Result<Option<Zeroizing<String>>> {
    secret_payload(project)
        .map(|payload| serde_json::to_string(&payload).map(Zeroizing::new))
        .transpose()
        .map_err(Into::into)
}
