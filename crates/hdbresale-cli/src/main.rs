use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hdbresale_core::Config;
use hdbresale_core::aggregate::{Aggregation, Column};
use hdbresale_core::slice::{FeatureFilter, YearRange};
use hdbresale_geocode::NominatimClient;
use hdbresale_store::ArtifactCache;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod display;
mod pipeline;
mod summary;

const DEFAULT_CONFIG: &str = "hdbresale.toml";

#[derive(Parser)]
#[command(name = "hdbresale", version, about = "HDB resale transaction pipeline")]
struct Cli {
    /// TOML config file. Defaults apply when unset and hdbresale.toml is absent.
    #[arg(long, short, global = true, env = "HDBRESALE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize the raw CSVs into the Parquet artifact
    Prepare,
    /// Geocode the configured CSV into part files, skipping finished batches
    Geocode,
    /// Concatenate geocoded part files into one artifact
    Combine,
    /// Print transaction counts and price statistics from an artifact
    Summary {
        /// Artifact to read. Defaults to the normalized artifact.
        #[arg(long)]
        artifact: Option<PathBuf>,
        /// Keep years strictly after this one (requires --end)
        #[arg(long, requires = "end")]
        start: Option<i32>,
        /// Keep years strictly before this one (requires --start)
        #[arg(long, requires = "start")]
        end: Option<i32>,
        #[arg(long = "town")]
        towns: Vec<String>,
        #[arg(long = "flat-type")]
        flat_types: Vec<String>,
        #[arg(long = "flat-model")]
        flat_models: Vec<String>,
        /// Only records geocoded inside Singapore
        #[arg(long)]
        singapore_only: bool,
        /// Column to group price statistics by
        #[arg(long, default_value = "town")]
        by: Column,
        /// mean, median, min or max
        #[arg(long, default_value = "median")]
        agg: Aggregation,
        /// Rows shown per count table
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(Config::from_path(path)?),
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            Ok(Config::from_path(Path::new(DEFAULT_CONFIG))?)
        }
        None => {
            info!("no config file, using defaults");
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    info!("hdbresale v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Prepare => {
            eprintln!("Preparing {}", config.etl.csv_path.display());
            let stats = pipeline::prepare(&config.etl)?;
            eprintln!(
                "Normalized {} of {} rows ({} skipped) in {:.1}s -> {}",
                stats.normalized,
                stats.rows,
                stats.skipped,
                stats.elapsed_secs,
                stats.artifact.display()
            );
        }
        Commands::Geocode => {
            let geocoder =
                NominatimClient::new(&config.geocode.endpoint, &config.geocode.user_agent)?;
            let stats =
                pipeline::geocode(&config.geocode, config.etl.row_policy, &geocoder).await?;
            eprintln!(
                "Geocoded {} batches ({} already done): {} located, {} not found, {} failed",
                stats.batches_written,
                stats.batches_skipped,
                stats.located,
                stats.not_found,
                stats.failed
            );
        }
        Commands::Combine => {
            let (rows, out) = pipeline::combine(&config.geocode_combine)?;
            eprintln!("Combined {rows} rows -> {}", out.display());
        }
        Commands::Summary {
            artifact,
            start,
            end,
            towns,
            flat_types,
            flat_models,
            singapore_only,
            by,
            agg,
            limit,
        } => {
            let path = artifact.unwrap_or_else(|| config.etl.artifact_path());
            let cache = ArtifactCache::new(Duration::from_secs(300));
            let records = cache
                .get_or_load(&path)
                .with_context(|| format!("loading {}", path.display()))?;

            let selection = summary::Selection {
                years: start.zip(end).map(|(s, e)| YearRange::new(s, e)),
                features: FeatureFilter {
                    flat_types: flat_types.into_iter().collect(),
                    towns: towns.into_iter().collect(),
                    flat_models: flat_models.into_iter().collect(),
                },
                singapore_only,
            };
            let selected = selection.select(&records);
            summary::print_summary(&selected, by, agg, limit)?;
        }
    }

    Ok(())
}
