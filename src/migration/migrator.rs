use std::sync::Arc;

use tracing::{debug, info, warn};

use super::transform::is_http_remote;
use crate::error::{Error, Phase, Result};
use crate::secrets::SecretStore;
use crate::store::ProjectStore;
use crate::types::LegacyProject;

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Projects moved to the secure format, in processing order.
    pub migrated: Vec<String>,
    /// Migrated projects whose remote is not HTTP(S) and was recorded as an
    /// unclassified transport.
    pub unclassified: Vec<String>,
}

impl MigrationReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrated.is_empty()
    }
}

pub struct ProjectCredentialsMigrator {
    projects: Arc<dyn ProjectStore>,
    secrets: Arc<dyn SecretStore>,
}

impl ProjectCredentialsMigrator {
    pub fn new(projects: Arc<dyn ProjectStore>, secrets: Arc<dyn SecretStore>) -> Self {
        Self { projects, secrets }
    }

    /// Names of projects a run would migrate. Writes nothing.
    pub fn pending(&self) -> Result<Vec<String>> {
        let candidates = self.fetch_candidates()?;
        Ok(candidates.into_iter().map(|p| p.name).collect())
    }

    /// Migrates every legacy project, stopping at the first failure.
    ///
    /// Callers must not run two migrations against the same stores at once.
    pub fn run(&self) -> Result<MigrationReport> {
        let candidates = self.fetch_candidates()?;
        if candidates.is_empty() {
            info!("no projects with legacy git credentials found");
            return Ok(MigrationReport::default());
        }

        info!(count = candidates.len(), "migrating legacy git credentials");

        self.migrate_secrets(&candidates)?;
        let report = self.migrate_projects(&candidates)?;

        info!(
            migrated = report.migrated.len(),
            unclassified = report.unclassified.len(),
            "git credential migration complete"
        );
        Ok(report)
    }

    fn fetch_candidates(&self) -> Result<Vec<LegacyProject>> {
        self.projects
            .fetch_legacy_candidates()
            .map_err(|e| Error::Fetch(Box::new(e)))
    }

    fn migrate_secrets(&self, candidates: &[LegacyProject]) -> Result<()> {
        for project in candidates {
            self.secrets
                .upsert_project_secret(project)
                .map_err(|e| phase_error(Phase::Secret, project, e))?;
            debug!(project = %project.name, "secret migrated");
        }
        Ok(())
    }

    fn migrate_projects(&self, candidates: &[LegacyProject]) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        for project in candidates {
            self.projects
                .persist_migrated_project(project)
                .map_err(|e| phase_error(Phase::Record, project, e))?;

            if project.remote_url().is_some_and(|url| !is_http_remote(url)) {
                warn!(
                    project = %project.name,
                    "remote is not HTTP(S); stored as unclassified transport, needs review"
                );
                report.unclassified.push(project.name.clone());
            }
            debug!(project = %project.name, "project record migrated");
            report.migrated.push(project.name.clone());
        }

        Ok(report)
    }
}

fn phase_error(phase: Phase, project: &LegacyProject, source: Error) -> Error {
    Error::Migration {
        phase,
        project: project.name.clone(),
        source: Box::new(source),
    }
}
