//! diesel-stable - batch driver for the stable-period pipeline
//!
//! Reads the run catalog, processes the selected bench files and writes one
//! steady-state CSV per run plus a versioned metadata file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use diesel_stable::catalog::{Catalog, CatalogBuilder};
use diesel_stable::fuels::FuelTable;
use diesel_stable::metadata::MetadataStore;
use diesel_stable::observer::RunState;
use diesel_stable::pipeline::Pipeline;
use diesel_stable::settings::{PipelineSettings, CONFIG_ENV_VAR};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "diesel-stable")]
#[command(about = "Stable-period extraction for diesel engine test-bench logs")]
#[command(version)]
struct CliArgs {
    /// Settings file (JSON). Defaults to the user config directory.
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Process catalog entries (all entries when no id is given)
    Process {
        /// Catalog id to process; may be repeated
        #[arg(long = "id")]
        ids: Vec<u32>,
        /// Catalog file, overriding the settings
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Build a catalog from the bench files in a directory
    Catalog {
        /// Directory with bench exports
        dir: PathBuf,
        /// Where to write the catalog (default: settings catalog file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective settings as JSON
    PrintConfig,
}

fn load_settings(path: Option<&PathBuf>) -> Result<PipelineSettings> {
    match path {
        Some(path) => PipelineSettings::load(path),
        None => PipelineSettings::load_or_default(),
    }
}

fn run_process(settings: PipelineSettings, ids: &[u32], catalog: Option<PathBuf>) -> Result<bool> {
    let catalog_path = catalog.unwrap_or_else(|| settings.paths.catalog_file.clone());
    let catalog = Catalog::load(&catalog_path)?;
    let fuels = FuelTable::load(&settings.paths.fuel_table_file)?;

    let store = Arc::new(MetadataStore::new(
        settings.paths.metadata_dir.clone(),
        &settings.pipeline_name,
        &settings.metadata_version,
    ));
    let pipeline = Pipeline::new(settings, fuels, store.clone())
        .context("Invalid pipeline settings")?;

    let report = pipeline.run_batch(&catalog, ids);
    println!("{}", report);

    store.finalize();
    store.save()?;

    Ok(report.count(RunState::Failed) == 0)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let settings = load_settings(args.config.as_ref())?;

    match args.command {
        SubCommand::Process { ids, catalog } => {
            info!("Starting data pipeline");
            if !run_process(settings, &ids, catalog)? {
                std::process::exit(1);
            }
        }
        SubCommand::Catalog { dir, output } => {
            let catalog = CatalogBuilder::default().scan(&dir)?;
            let output = output.unwrap_or_else(|| settings.paths.catalog_file.clone());
            catalog.save(&output)?;
            println!("{} entries written to {}", catalog.len(), output.display());
        }
        SubCommand::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
