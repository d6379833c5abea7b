//! # Credshift
//!
//! Moves git credentials stored inline on project records into a dedicated
//! secret store, leaving the project record with non-secret configuration
//! only. The migration is one-time in effect but safe to re-run: projects
//! already migrated are never selected again.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use credshift::migration::ProjectCredentialsMigrator;
//! use credshift::secrets::SqliteSecretStore;
//! use credshift::store::SqliteStore;
//!
//! let projects = SqliteStore::new("./data/projects.db");
//! let secrets = SqliteSecretStore::new("./data/secrets.db");
//! secrets.initialize()?;
//!
//! let migrator = ProjectCredentialsMigrator::new(Arc::new(projects), Arc::new(secrets));
//! let report = migrator.run()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `credshift` binary. Disable with `default-features = false`.

pub mod config;
pub mod error;
pub mod migration;
pub mod secrets;
pub mod store;
pub mod types;
