//! CLI integration tests for the credshift binary.
//!
//! Each test uses an isolated temp directory for its databases, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::TempDir;
use credshift::secrets::SqliteSecretStore;
use credshift::store::SqliteStore;
use credshift::types::{GitAuth, LegacyProject};
use predicates::prelude::*;
use secrecy::ExposeSecret;
use serde_json::Value;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn project_db(&self) -> PathBuf {
        self.data_dir().join("projects.db")
    }

    fn seed(&self, projects: &[LegacyProject]) -> SqliteStore {
        let store = SqliteStore::new(self.project_db());
        store.initialize().expect("failed to initialize project store");
        for project in projects {
            store
                .create_legacy_project(project)
                .expect("failed to seed project");
        }
        store
    }

    fn secrets(&self) -> SqliteSecretStore {
        SqliteSecretStore::new(self.data_dir().join("secrets.db"))
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("credshift").expect("failed to find binary");
        cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, subcommand: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([subcommand, "--data-dir", &self.data_dir_str()])
            .assert()
    }
}

fn legacy(name: &str, remote_url: &str) -> LegacyProject {
    LegacyProject {
        name: name.to_string(),
        git_remote_url: Some(remote_url.to_string()),
        git_user: Some("alice".to_string()),
        git_token: Some("ghp_secret".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_migrate_moves_credentials() {
    let ctx = TestContext::new();
    let mut project = legacy("proj1", "https://git.example.com/r.git");
    project.insecure_skip_tls = true;
    let store = ctx.seed(&[project]);

    ctx.run("migrate")
        .success()
        .stdout(predicate::str::contains("Migrated 1 project(s)"))
        .stdout(predicate::str::contains("proj1"));

    let stored = store.get_project("proj1").unwrap().unwrap();
    assert!(!stored.has_legacy_fields());
    let creds = stored.git_credentials.unwrap();
    assert!(creds.auth.as_https().unwrap().insecure_skip_tls);

    let secret = ctx.secrets().get_project_secret("proj1").unwrap().unwrap();
    let payload: Value = serde_json::from_str(secret.expose_secret()).unwrap();
    assert_eq!(payload["https"]["token"], "ghp_secret");
}

#[test]
fn test_migrate_twice_is_idempotent() {
    let ctx = TestContext::new();
    ctx.seed(&[legacy("proj1", "https://git.example.com/r.git")]);

    ctx.run("migrate")
        .success()
        .stdout(predicate::str::contains("Migrated 1 project(s)"));
    ctx.run("migrate")
        .success()
        .stdout(predicate::str::contains("Migrated 0 project(s)"));

    assert_eq!(ctx.secrets().list_secret_names().unwrap().len(), 1);
}

#[test]
fn test_migrate_flags_unclassified_transport() {
    let ctx = TestContext::new();
    let store = ctx.seed(&[legacy("sshproj", "git@git.example.com:org/r.git")]);

    ctx.run("migrate")
        .success()
        .stdout(predicate::str::contains("sshproj (unclassified transport"));

    let creds = store
        .get_project("sshproj")
        .unwrap()
        .unwrap()
        .git_credentials
        .unwrap();
    assert_eq!(
        creds.auth,
        GitAuth::Unclassified {
            scheme: "ssh".to_string()
        }
    );
}

#[test]
fn test_pending_lists_candidates_without_writing() {
    let ctx = TestContext::new();
    let plain = LegacyProject {
        name: "plain".to_string(),
        ..Default::default()
    };
    let store = ctx.seed(&[legacy("proj1", "https://git.example.com/r.git"), plain]);

    ctx.run("pending")
        .success()
        .stdout(predicate::str::contains("proj1"))
        .stdout(predicate::str::contains("plain").not());

    assert!(store.get_project("proj1").unwrap().unwrap().has_legacy_fields());
    assert!(!ctx.data_dir().join("secrets.db").exists());
}

#[test]
fn test_pending_after_migration_is_empty() {
    let ctx = TestContext::new();
    ctx.seed(&[legacy("proj1", "https://git.example.com/r.git")]);

    ctx.run("migrate").success();
    ctx.run("pending")
        .success()
        .stdout(predicate::str::contains("No projects with legacy git credentials"));
}

#[test]
fn test_migrate_without_project_database_fails() {
    let ctx = TestContext::new();

    ctx.run("migrate")
        .failure()
        .stderr(predicate::str::contains("Project database not found"));
}

#[test]
fn test_config_file_sets_databases() {
    let ctx = TestContext::new();
    let store = SqliteStore::new(ctx.data_dir().join("shipyard.db"));
    store.initialize().unwrap();
    store
        .create_legacy_project(&legacy("proj1", "https://git.example.com/r.git"))
        .unwrap();

    let config_path = ctx.data_dir().join("credshift.toml");
    std::fs::write(
        &config_path,
        format!(
            "data_dir = {:?}\nproject_db = \"shipyard.db\"\nsecret_db = \"vault.db\"\n",
            ctx.data_dir_str()
        ),
    )
    .unwrap();

    ctx.cmd()
        .args(["migrate", "--config", &config_path.to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Migrated 1 project(s)"));

    let secrets = SqliteSecretStore::new(ctx.data_dir().join("vault.db"));
    assert!(secrets.get_project_secret("proj1").unwrap().is_some());
}

#[test]
fn test_unreachable_secret_store_blocks_migration() {
    let ctx = TestContext::new();
    let store = ctx.seed(&[legacy("proj1", "https://git.example.com/r.git")]);

    let config_path = ctx.data_dir().join("credshift.toml");
    std::fs::write(
        &config_path,
        format!(
            "data_dir = {:?}\nsecret_db = \"missing/secrets.db\"\n",
            ctx.data_dir_str()
        ),
    )
    .unwrap();

    ctx.cmd()
        .args(["migrate", "--config", &config_path.to_string_lossy()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("store unavailable"));

    assert!(store.get_project("proj1").unwrap().unwrap().has_legacy_fields());
}

#[test]
fn test_unparseable_log_level_is_reported() {
    let ctx = TestContext::new();
    ctx.seed(&[legacy("proj1", "https://git.example.com/r.git")]);

    ctx.cmd()
        .env("LOG_LEVEL", "loud")
        .args(["pending", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "could not parse log level provided by 'LOG_LEVEL' env var",
        ))
        .stdout(predicate::str::contains("proj1"));
}

#[cfg(unix)]
#[test]
fn test_migrate_leaves_secret_files_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    ctx.seed(&[legacy("proj1", "https://git.example.com/r.git")]);

    ctx.run("migrate").success();

    for name in ["secrets.db", "secrets.db-wal", "secrets.db-shm"] {
        let path = ctx.data_dir().join(name);
        if path.exists() {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{name}");
        }
    }
}
