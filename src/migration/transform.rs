//! Pure mapping from legacy project records to the secure credential shape.

use crate::types::{GitAuth, GitCredentials, HttpsGitAuth, LegacyProject, Project, ProxyGitAuth};

const HTTP_PREFIX: &str = "http";

/// Builds the secure-format project for a legacy record.
///
/// Returns `None` when the record carries no remote URL, which covers both
/// projects that never had credentials and projects already migrated.
#[must_use]
pub fn transform_git_credentials(project: &LegacyProject) -> Option<Project> {
    let remote_url = project.remote_url()?;

    let auth = if is_http_remote(remote_url) {
        GitAuth::Https(HttpsGitAuth {
            insecure_skip_tls: project.insecure_skip_tls,
            proxy: proxy_auth(project),
        })
    } else {
        GitAuth::Unclassified {
            scheme: remote_scheme(remote_url),
        }
    };

    Some(Project {
        name: project.name.clone(),
        metadata: project.metadata.clone(),
        git_credentials: Some(GitCredentials {
            remote_url: remote_url.to_string(),
            user: project.git_user.clone().unwrap_or_default(),
            auth,
        }),
    })
}

fn proxy_auth(project: &LegacyProject) -> Option<ProxyGitAuth> {
    let url = project.proxy_url()?;
    Some(ProxyGitAuth {
        scheme: project.proxy_scheme().unwrap_or_default().to_string(),
        url: url.to_string(),
        user: project.proxy_user().unwrap_or_default().to_string(),
    })
}

/// True for remotes reached over HTTP(S).
#[must_use]
pub fn is_http_remote(remote_url: &str) -> bool {
    remote_url.starts_with(HTTP_PREFIX)
}

/// Best-effort transport scheme of a non-HTTP remote.
///
/// `scheme://...` yields `scheme`; scp-style `user@host:path` yields `ssh`;
/// anything else (a bare path) yields an empty string.
#[must_use]
pub fn remote_scheme(remote_url: &str) -> String {
    if let Some((scheme, _)) = remote_url.split_once("://") {
        return scheme.to_ascii_lowercase();
    }
    match remote_url.find(':') {
        Some(idx) if idx > 0 && !remote_url[..idx].contains('/') => "ssh".to_string(),
        _ => String::new(),
    }
}
