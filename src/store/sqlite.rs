use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ProjectStore;
use super::connection::{DEFAULT_CONNECT_TIMEOUT, LazyConnection};
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::migration::transform_git_credentials;
use crate::types::*;

const PROJECT_COLUMNS: &str = "name, creation_date, last_event_context, shipyard, shipyard_version, stages,
        git_remote_url, git_user, git_token, git_proxy_url, git_proxy_scheme, git_proxy_user,
        git_proxy_password, insecure_skip_tls, git_credentials";

pub struct SqliteStore {
    db: LazyConnection,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self::with_connect_timeout(db_path, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout<P: AsRef<Path>>(db_path: P, connect_timeout: Duration) -> Self {
        Self {
            db: LazyConnection::new(db_path, connect_timeout),
        }
    }

    pub fn initialize(&self) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
    }

    /// Inserts a project in the legacy shape.
    pub fn create_legacy_project(&self, project: &LegacyProject) -> Result<()> {
        let meta = &project.metadata;
        let last_event_context = to_json(&meta.last_event_context)?;
        let stages = serde_json::to_string(&meta.stages)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (name, creation_date, last_event_context, shipyard, shipyard_version,
                    stages, git_remote_url, git_user, git_token, git_proxy_url, git_proxy_scheme,
                    git_proxy_user, git_proxy_password, insecure_skip_tls)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    project.name,
                    meta.creation_date.as_ref().map(format_datetime),
                    last_event_context,
                    meta.shipyard,
                    meta.shipyard_version,
                    stages,
                    project.git_remote_url,
                    project.git_user,
                    project.git_token,
                    project.git_proxy_url,
                    project.git_proxy_scheme,
                    project.git_proxy_user,
                    project.git_proxy_password,
                    project.insecure_skip_tls,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_project(&self, name: &str) -> Result<Option<StoredProject>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1"),
                params![name],
                stored_from_row,
            )
            .optional()
            .map_err(Error::from)
        })
    }

    pub fn list_projects(&self) -> Result<Vec<StoredProject>> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name"))?;
            let rows = stmt.query_map([], stored_from_row)?;

            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from)
        })
    }

    /// Replaces a record by identity with its secure shape.
    fn replace_project(&self, project: &Project) -> Result<()> {
        let meta = &project.metadata;
        let last_event_context = to_json(&meta.last_event_context)?;
        let stages = serde_json::to_string(&meta.stages)?;
        let git_credentials = to_json(&project.git_credentials)?;

        self.db.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE projects SET
                    creation_date = ?1, last_event_context = ?2, shipyard = ?3,
                    shipyard_version = ?4, stages = ?5, git_credentials = ?6,
                    git_remote_url = NULL, git_user = NULL, git_token = NULL,
                    git_proxy_url = NULL, git_proxy_scheme = NULL, git_proxy_user = NULL,
                    git_proxy_password = NULL, insecure_skip_tls = 0
                 WHERE name = ?7",
                params![
                    meta.creation_date.as_ref().map(format_datetime),
                    last_event_context,
                    meta.shipyard,
                    meta.shipyard_version,
                    stages,
                    git_credentials,
                    project.name,
                ],
            )?;

            if rows == 0 {
                return Err(Error::NotFound);
            }
            Ok(())
        })
    }
}

impl ProjectStore for SqliteStore {
    fn fetch_legacy_candidates(&self) -> Result<Vec<LegacyProject>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects
                     WHERE git_remote_url IS NOT NULL AND git_remote_url != ''
                     ORDER BY name"
                ))
                .map_err(Error::Query)?;

            let rows = stmt
                .query_map([], legacy_from_row)
                .map_err(Error::Query)?;

            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::Query)
        })
    }

    fn persist_migrated_project(&self, project: &LegacyProject) -> Result<()> {
        let Some(migrated) = transform_git_credentials(project) else {
            debug!(project = %project.name, "no legacy git credentials, nothing to persist");
            return Ok(());
        };

        self.replace_project(&migrated)
            .map_err(|e| Error::Persist {
                project: project.name.clone(),
                source: Box::new(e),
            })?;

        debug!(project = %project.name, "project record rewritten with secure credentials");
        Ok(())
    }
}

fn legacy_from_row(row: &Row<'_>) -> rusqlite::Result<LegacyProject> {
    Ok(LegacyProject {
        name: row.get(0)?,
        metadata: ProjectMetadata {
            creation_date: row
                .get::<_, Option<String>>(1)?
                .map(|s| parse_datetime(1, &s))
                .transpose()?,
            last_event_context: json_column(row, 2)?,
            shipyard: row.get(3)?,
            shipyard_version: row.get(4)?,
            stages: json_column(row, 5)?.unwrap_or_default(),
        },
        git_remote_url: row.get(6)?,
        git_user: row.get(7)?,
        git_token: row.get(8)?,
        git_proxy_url: row.get(9)?,
        git_proxy_scheme: row.get(10)?,
        git_proxy_user: row.get(11)?,
        git_proxy_password: row.get(12)?,
        insecure_skip_tls: row.get(13)?,
    })
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredProject> {
    Ok(StoredProject {
        legacy: legacy_from_row(row)?,
        git_credentials: json_column(row, 14)?,
    })
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| {
            serde_json::from_str(&s)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
        })
        .transpose()
}

fn to_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Error::from)
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
