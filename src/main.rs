use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use credshift::config::MigrationConfig;
use credshift::migration::ProjectCredentialsMigrator;
use credshift::secrets::SqliteSecretStore;
use credshift::store::SqliteStore;

const DEFAULT_DIRECTIVE: &str = "credshift=info";
/// Log level variable honoured by the services that host the migration.
const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

#[derive(Parser)]
#[command(name = "credshift")]
#[command(about = "Moves inline git credentials from project records into the secret store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every project still holding legacy git credentials
    Migrate {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// List projects that still hold legacy git credentials
    Pending {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory holding the project and secret databases
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Seconds to wait for a database connection before giving up
    #[arg(long)]
    connect_timeout_secs: Option<u64>,
}

impl StoreArgs {
    fn resolve(self) -> anyhow::Result<MigrationConfig> {
        let mut config = match &self.config {
            Some(path) => MigrationConfig::from_file(path)?,
            None => MigrationConfig::default(),
        };
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

fn open_migrator(
    config: &MigrationConfig,
    init_secrets: bool,
) -> anyhow::Result<ProjectCredentialsMigrator> {
    let project_db = config.project_db_path();
    if !project_db.exists() {
        bail!("Project database not found at {}", project_db.display());
    }

    let projects = SqliteStore::with_connect_timeout(&project_db, config.connect_timeout());
    let secrets =
        SqliteSecretStore::with_connect_timeout(config.secret_db_path(), config.connect_timeout());
    if init_secrets {
        secrets.initialize()?;
    }

    Ok(ProjectCredentialsMigrator::new(
        Arc::new(projects),
        Arc::new(secrets),
    ))
}

/// Builds the log filter. Also returns a `LOG_LEVEL` value that could not be
/// parsed, so it can be reported once logging is up.
fn env_filter() -> anyhow::Result<(EnvFilter, Option<String>)> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok((EnvFilter::from_default_env(), None));
    }

    let Ok(level) = std::env::var(LOG_LEVEL_ENV) else {
        return Ok((EnvFilter::default().add_directive(DEFAULT_DIRECTIVE.parse()?), None));
    };

    match format!("credshift={}", level.to_lowercase()).parse::<Directive>() {
        Ok(directive) => Ok((EnvFilter::default().add_directive(directive), None)),
        Err(_) => Ok((
            EnvFilter::default().add_directive(DEFAULT_DIRECTIVE.parse()?),
            Some(level),
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter, invalid_level) = env_filter()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(level) = invalid_level {
        warn!(level = %level, "could not parse log level provided by '{LOG_LEVEL_ENV}' env var, using info");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { store } => {
            let config = store.resolve()?;
            let migrator = open_migrator(&config, true)?;

            info!(data_dir = %config.data_dir.display(), "starting git credential migration");

            let result = tokio::task::spawn_blocking(move || migrator.run()).await?;
            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    error!("git credential migration failed, re-run to resume: {e}");
                    return Err(e.into());
                }
            };

            println!("Migrated {} project(s)", report.migrated.len());
            for name in &report.migrated {
                if report.unclassified.contains(name) {
                    println!("  {name} (unclassified transport, review required)");
                } else {
                    println!("  {name}");
                }
            }
        }
        Commands::Pending { store } => {
            let config = store.resolve()?;
            let migrator = open_migrator(&config, false)?;

            let pending = tokio::task::spawn_blocking(move || migrator.pending()).await??;
            if pending.is_empty() {
                println!("No projects with legacy git credentials");
            }
            for name in pending {
                println!("{name}");
            }
        }
    }

    Ok(())
}
