pub mod connection;
pub(crate) mod schema;
mod sqlite;

pub use connection::{DEFAULT_CONNECT_TIMEOUT, LazyConnection};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::LegacyProject;

/// ProjectStore is the project-record side of the migration.
pub trait ProjectStore: Send + Sync {
    /// Returns every project still holding a non-empty legacy remote URL.
    ///
    /// Either the whole candidate set is returned or the call fails.
    fn fetch_legacy_candidates(&self) -> Result<Vec<LegacyProject>>;

    /// Rewrites a legacy record in the secure shape, clearing its inline
    /// credential fields. A record without credentials is left alone.
    fn persist_migrated_project(&self, project: &LegacyProject) -> Result<()>;
}
