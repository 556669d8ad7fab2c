//! Command-line interface for clustermerge.
//!
//! Consolidates JSON-lines event files by merging noise clusters into
//! their neighbours and reports merge and energy statistics.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};
use clustermerge_algorithms::{
    ConsolidationPipeline, EnergyHistogram, MergeConfig, MergePolicy, PipelineConfig,
    StatisticsCollector,
};
use clustermerge_core::Event;
use clustermerge_io::{consolidate_store, EnergyCsvWriter, JsonLinesReader, JsonLinesStore};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    ClustermergeIo(#[from] clustermerge_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] clustermerge_core::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_json::Error),
}

/// Merge policy selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Merge every noise cluster into its nearest normal cluster
    EachLow,
    /// Merge only the lowest-energy cluster of each event
    MinimumEnergy,
}

impl From<Policy> for MergePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::EachLow => MergePolicy::EachLow,
            Policy::MinimumEnergy => MergePolicy::MinimumEnergy,
        }
    }
}

/// Settings file layout; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    merge: MergeConfig,
    pipeline: PipelineConfig,
}

/// Noise-cluster merging for detector event files.
#[derive(Parser)]
#[command(name = "clustermerge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge noise clusters and write consolidated events
    Merge {
        /// Input event file (JSON lines)
        input: PathBuf,

        /// Output event file (JSON lines)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON settings file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Merge policy
        #[arg(short, long, value_enum)]
        policy: Option<Policy>,

        /// Noise clusters have less energy than this
        #[arg(long)]
        energy_threshold: Option<f64>,

        /// Noise clusters have at most this many cells
        #[arg(long)]
        max_low_cells: Option<u32>,

        /// Search window along X
        #[arg(long)]
        window_x: Option<f64>,

        /// Search window along Y
        #[arg(long)]
        window_y: Option<f64>,

        /// Process events on all cores
        #[arg(long)]
        parallel: bool,

        /// Stop at the first integrity error
        #[arg(long)]
        fail_fast: bool,

        /// Write surviving cluster energies to this CSV file
        #[arg(long)]
        energies: Option<PathBuf>,

        /// Write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Show information about an event file
    Info {
        /// Input event file (JSON lines)
        input: PathBuf,
    },

    /// Print an energy histogram of an event file
    Summary {
        /// Input event file (JSON lines)
        input: PathBuf,

        /// Number of bins
        #[arg(long, default_value = "100")]
        bins: usize,

        /// Lower edge of the histogram
        #[arg(long, default_value = "0.0")]
        low: f64,

        /// Upper edge of the histogram
        #[arg(long, default_value = "500.0")]
        high: f64,
    },
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => {
            let reader = BufReader::new(File::open(path)?);
            let config: ConfigFile = serde_json::from_reader(reader)?;
            debug!("loaded settings from {}: {:?}", path.display(), config);
            Ok(config)
        }
        None => Ok(ConfigFile::default()),
    }
}

fn read_events(path: &Path) -> Result<Vec<Event>> {
    let events = JsonLinesReader::open(path)?.collect::<clustermerge_io::Result<Vec<_>>>()?;
    Ok(events)
}

fn print_histogram(histogram: &EnergyHistogram) {
    let peak = histogram.counts().iter().copied().max().unwrap_or(0).max(1);
    for (bin, &count) in histogram.counts().iter().enumerate() {
        let bar = "#".repeat((count * 50 / peak) as usize);
        println!("{:>9.2} | {:>8} {}", histogram.bin_low(bin), count, bar);
    }
    println!(
        "underflow: {}, overflow: {}",
        histogram.underflow(),
        histogram.overflow()
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Merge {
            input,
            output,
            config,
            policy,
            energy_threshold,
            max_low_cells,
            window_x,
            window_y,
            parallel,
            fail_fast,
            energies,
            summary_json,
        } => {
            let ConfigFile {
                merge: mut merge_config,
                pipeline: mut pipeline_config,
            } = load_config(config.as_deref())?;

            if let Some(threshold) = energy_threshold {
                merge_config.low_energy_threshold = threshold;
            }
            if let Some(cells) = max_low_cells {
                merge_config.max_low_cells = cells;
            }
            if let Some(window) = window_x {
                merge_config.window_x = window;
            }
            if let Some(window) = window_y {
                merge_config.window_y = window;
            }
            if let Some(policy) = policy {
                pipeline_config.policy = policy.into();
            }
            pipeline_config.parallel |= parallel;
            pipeline_config.fail_fast |= fail_fast;

            info!("merge settings: {:?}", merge_config);
            info!("pipeline settings: {:?}", pipeline_config);

            let start = Instant::now();
            let pipeline = ConsolidationPipeline::new(merge_config, pipeline_config)?;
            let mut store = JsonLinesStore::new(&input, &output);
            let report = consolidate_store(&mut store, &pipeline)?;
            let elapsed = start.elapsed();

            for rejected in &report.rejected {
                eprintln!("Skipped event {}: {}", rejected.event_id, rejected.error);
            }

            let mut collector = StatisticsCollector::new();
            collector.record(&report);
            let summary = collector.summary();

            println!(
                "Processed {} events in {:.2}s",
                summary.total_events,
                elapsed.as_secs_f64()
            );
            println!("Discarded events: {}", summary.discarded_events);
            if summary.rejected_events > 0 {
                println!("Rejected events: {}", summary.rejected_events);
            }
            println!("Merged clusters: {}", summary.merged_clusters);
            if summary.degenerate_merges > 0 {
                println!("Zero-energy merges: {}", summary.degenerate_merges);
            }
            match summary.mean_energy {
                Some(mean) => println!(
                    "New clusters: {}, mean energy: {:.2}",
                    summary.cluster_count, mean
                ),
                None => println!("New clusters: 0"),
            }
            println!("Output: {}", output.display());

            if let Some(path) = energies {
                EnergyCsvWriter::create(&path)?.write_energies(collector.energies())?;
                println!("Energies: {}", path.display());
            }
            if let Some(path) = summary_json {
                serde_json::to_writer_pretty(File::create(&path)?, &summary)?;
                println!("Summary: {}", path.display());
            }
        }

        Commands::Info { input } => {
            let events = read_events(&input)?;
            let config = MergeConfig::default();
            let clusters: usize = events.iter().map(Event::cluster_count).sum();
            let cells: usize = events.iter().map(Event::cell_count).sum();
            let noise = events
                .iter()
                .flat_map(|e| e.clusters.iter())
                .filter(|cluster| config.is_noise(cluster))
                .count();
            let broken = events.iter().filter(|e| e.validate().is_err()).count();

            println!("File: {}", input.display());
            println!("Events: {}", events.len());
            println!("Clusters: {}", clusters);
            println!("Cells: {}", cells);
            println!("Noise clusters: {}", noise);
            if broken > 0 {
                println!("Events failing integrity checks: {}", broken);
            }
        }

        Commands::Summary {
            input,
            bins,
            low,
            high,
        } => {
            let events = read_events(&input)?;
            let collector = StatisticsCollector::from_events(&events);
            let summary = collector.summary();

            println!("Events: {}", summary.total_events);
            println!("Clusters: {}", summary.cluster_count);
            if let (Some(mean), Some(min), Some(max)) =
                (summary.mean_energy, summary.min_energy, summary.max_energy)
            {
                println!("Energy: mean {:.2}, min {:.2}, max {:.2}", mean, min, max);
            }

            print_histogram(&collector.histogram(bins, low, high)?);
        }
    }

    Ok(())
}
