//! Moves inline git credentials out of project records.
//!
//! The run is a two-phase sweep over one candidate set: every secret is
//! written before any project record is rewritten. There is no transaction
//! spanning both stores, so a failed run may leave projects whose secret is
//! written but whose record is still legacy. Those stay candidates and the
//! next run finishes them.

mod migrator;
pub mod transform;

pub use migrator::{MigrationReport, ProjectCredentialsMigrator};
pub use transform::transform_git_credentials;
