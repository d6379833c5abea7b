use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The sweep over the candidate set in which a migration failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Secret,
    Record,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Secret => f.write_str("secret"),
            Phase::Record => f.write_str("record"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("query failed: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("could not write secret for project {project}: {source}")]
    SecretWrite {
        project: String,
        #[source]
        source: BoxError,
    },

    #[error("could not persist project {project}: {source}")]
    Persist {
        project: String,
        #[source]
        source: BoxError,
    },

    #[error("could not fetch projects with legacy git credentials: {0}")]
    Fetch(#[source] Box<Error>),

    #[error("{phase} phase failed for project {project}: {source}")]
    Migration {
        phase: Phase,
        project: String,
        #[source]
        source: Box<Error>,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not found")]
    NotFound,
}

impl Error {
    /// Name of the project the failure is attributed to, if any.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        match self {
            Error::SecretWrite { project, .. }
            | Error::Persist { project, .. }
            | Error::Migration { project, .. } => Some(project),
            _ => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Migration { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
