use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use shopmigrate_core::app::MigratorBuilder;
use shopmigrate_core::config::MigrationConfig;
use shopmigrate_core::domain::{ShopId, TargetRecord};
use shopmigrate_core::impls::{
    FsRelocator, InMemoryLegacySource, InMemoryTargetStore, StaticIdentities, StaticWorld,
    TracingProgress,
};
use shopmigrate_core::ports::{LegacySource, TargetStore};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Migrates legacy shops from a JSON export and prints the run report
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// JSON array of legacy shops
    #[arg(long)]
    legacy: PathBuf,
    /// JSON array of shops already in the target store
    #[arg(long)]
    existing: Option<PathBuf>,
    /// Migration config (JSON); every field is optional
    #[arg(long, env = "SHOPMIGRATE_CONFIG")]
    config: Option<PathBuf>,
    /// Replace target shops that occupy a migrating coordinate
    #[arg(long, default_value_t = false)]
    override_existing: bool,
    /// Folder holding the legacy data directory
    #[arg(long)]
    data_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Run(args)) => run(args).await?,
        None => {
            println!("No subcommand provided. Use --help to see available commands.");
        }
    }

    Ok(())
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => MigrationConfig::from_json_file(path)?,
        None => MigrationConfig::default(),
    };
    if args.override_existing {
        config.override_existing = true;
    }
    if let Some(folder) = args.data_folder {
        config.data_folder = folder;
    }

    let raw = std::fs::read_to_string(&args.legacy)
        .with_context(|| format!("reading {}", args.legacy.display()))?;
    let source = Arc::new(
        InMemoryLegacySource::from_json_str(&raw)
            .with_context(|| format!("parsing {}", args.legacy.display()))?,
    );

    let store = Arc::new(InMemoryTargetStore::new(config.flush_retry.policy()));
    if let Some(path) = &args.existing {
        seed_store(&store, path)?;
    }

    // Exported shops still stand on their recorded containers.
    let world = StaticWorld::mirroring(&source.list_all());
    let override_existing = config.override_existing;

    let migrator = MigratorBuilder::new()
        .config(config)
        .legacy(source)
        .store(store.clone())
        .containers(Arc::new(world))
        .identities(Arc::new(StaticIdentities::lenient()))
        .relocator(Arc::new(FsRelocator))
        .progress(Arc::new(TracingProgress))
        .build()?;

    let run = migrator.spawn(override_existing);
    info!(run_id = %run.run_id(), "migration started");
    let report = run.join().await?;
    info!(shops = store.len(), dirty = store.dirty_count(), "target store after migration");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn seed_store(store: &InMemoryTargetStore, path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<TargetRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;

    for record in records {
        let coordinate = record.coordinate.clone();
        // The store hands out ids itself.
        if let Err(e) = store.register(record.with_id(ShopId::UNASSIGNED)) {
            warn!(%coordinate, "existing shop not seeded: {e}");
        }
    }
    Ok(())
}
