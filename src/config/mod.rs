mod migration;

pub use migration::MigrationConfig;
