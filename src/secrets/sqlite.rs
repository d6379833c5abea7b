use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use secrecy::SecretString;
use tracing::debug;

use super::{SecretStore, encode_payload, secret_name};
use crate::error::{Error, Result};
use crate::store::schema::SECRETS_SCHEMA;
use crate::store::{DEFAULT_CONNECT_TIMEOUT, LazyConnection};
use crate::types::LegacyProject;

/// Secret store kept in its own SQLite database, apart from project records.
pub struct SqliteSecretStore {
    db: LazyConnection,
}

impl SqliteSecretStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self::with_connect_timeout(db_path, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout<P: AsRef<Path>>(db_path: P, connect_timeout: Duration) -> Self {
        Self {
            db: LazyConnection::new(db_path, connect_timeout).private(),
        }
    }

    pub fn initialize(&self) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute_batch(SECRETS_SCHEMA)?;
            Ok(())
        })
    }

    pub fn get_secret(&self, name: &str) -> Result<Option<SecretString>> {
        let payload: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT payload FROM secrets WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::from)
        })?;

        Ok(payload.map(SecretString::from))
    }

    pub fn get_project_secret(&self, project: &str) -> Result<Option<SecretString>> {
        self.get_secret(&secret_name(project))
    }

    pub fn list_secret_names(&self) -> Result<Vec<String>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM secrets ORDER BY name")?;
            let rows = stmt.query_map([], |row| row.get(0))?;

            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        })
    }

    /// Returns false when the record implies no secret material.
    fn write_secret(&self, project: &LegacyProject) -> Result<bool> {
        let Some(payload) = encode_payload(project)? else {
            return Ok(false);
        };
        let name = secret_name(&project.name);
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO secrets (name, project, payload, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (name) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at",
                params![name, project.name, payload.as_str(), now],
            )?;
            Ok(true)
        })
    }
}

impl SecretStore for SqliteSecretStore {
    fn upsert_project_secret(&self, project: &LegacyProject) -> Result<()> {
        match self.write_secret(project) {
            Ok(true) => {
                debug!(project = %project.name, secret = %secret_name(&project.name), "secret upserted");
                Ok(())
            }
            Ok(false) => {
                debug!(project = %project.name, "no legacy git credentials, no secret to write");
                Ok(())
            }
            Err(e) => Err(Error::SecretWrite {
                project: project.name.clone(),
                source: Box::new(e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::Value;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> SqliteSecretStore {
        let store = SqliteSecretStore::new(temp.path().join("secrets.db"));
        store.initialize().unwrap();
        store
    }

    fn legacy(token: &str) -> LegacyProject {
        LegacyProject {
            name: "proj1".to_string(),
            git_remote_url: Some("https://git.example.com/r.git".to_string()),
            git_user: Some("alice".to_string()),
            git_token: Some(token.to_string()),
            ..Default::default()
        }
    }

    fn payload(store: &SqliteSecretStore, project: &str) -> Value {
        let secret = store.get_project_secret(project).unwrap().unwrap();
        serde_json::from_str(secret.expose_secret()).unwrap()
    }

    #[test]
    fn upsert_writes_secret_under_project_name() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.upsert_project_secret(&legacy("token-1")).unwrap();

        assert_eq!(store.list_secret_names().unwrap(), vec!["git-credentials-proj1"]);
        assert_eq!(payload(&store, "proj1")["https"]["token"], "token-1");
    }

    #[test]
    fn upsert_overwrites_instead_of_duplicating() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.upsert_project_secret(&legacy("token-1")).unwrap();
        store.upsert_project_secret(&legacy("token-2")).unwrap();

        assert_eq!(store.list_secret_names().unwrap().len(), 1);
        assert_eq!(payload(&store, "proj1")["https"]["token"], "token-2");
    }

    #[test]
    fn upsert_without_credentials_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let project = LegacyProject {
            name: "plain".to_string(),
            ..Default::default()
        };
        store.upsert_project_secret(&project).unwrap();

        assert!(store.list_secret_names().unwrap().is_empty());
    }

    #[test]
    fn write_failure_names_the_project() {
        let temp = TempDir::new().unwrap();
        // Never initialized: the secrets table does not exist.
        let store = SqliteSecretStore::new(temp.path().join("secrets.db"));

        let err = store.upsert_project_secret(&legacy("token-1")).unwrap_err();
        assert!(matches!(err, Error::SecretWrite { ref project, .. } if project == "proj1"));
        assert_eq!(err.project(), Some("proj1"));
    }

    #[cfg(unix)]
    #[test]
    fn secret_files_stay_owner_only_after_upsert() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        store.upsert_project_secret(&legacy("token-1")).unwrap();

        let wal = temp.path().join("secrets.db-wal");
        assert!(wal.exists());
        for path in [temp.path().join("secrets.db"), wal] {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", path.display());
        }
    }
}
