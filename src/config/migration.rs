use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::DEFAULT_CONNECT_TIMEOUT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    pub data_dir: PathBuf,
    /// Project database file, relative to `data_dir` unless absolute.
    pub project_db: PathBuf,
    /// Secret database file, relative to `data_dir` unless absolute.
    pub secret_db: PathBuf,
    /// Upper bound on acquiring a database connection.
    pub connect_timeout_secs: u64,
}

impl MigrationConfig {
    /// Loads a TOML file; keys it omits keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(Error::Config(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.project_db_path() == self.secret_db_path() {
            return Err(Error::Config(
                "project_db and secret_db must be different files".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn project_db_path(&self) -> PathBuf {
        self.data_dir.join(&self.project_db)
    }

    #[must_use]
    pub fn secret_db_path(&self) -> PathBuf {
        self.data_dir.join(&self.secret_db)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            project_db: PathBuf::from("projects.db"),
            secret_db: PathBuf::from("secrets.db"),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
        }
    }
}
