//! clustermerge-algorithms: Noise-cluster merging for detector events.
//!
//! This crate provides:
//! - **`NearestNormal`** - every noise cluster joins its closest-in-time normal neighbour
//! - **`MinimumEnergy`** - only the lowest-energy cluster of an event is merged
//! - **Pipeline** - drives an engine over many events, optionally in parallel
//! - **Statistics** - summary counters and energy histograms
//!

mod engine;
mod minimum;
mod nearest;
pub mod pipeline;
mod state;
pub mod statistics;

pub use engine::{
    consolidate_event, merger_for, DiscardReason, EventMerger, MergeOutcome, MergeStatistics,
};
pub use minimum::MinimumEnergyMerger;
pub use nearest::NearestNormalMerger;
pub use pipeline::{ConsolidationPipeline, DiscardCounts, PipelineReport, RejectedEvent};
pub use statistics::{EnergyHistogram, RunSummary, StatisticsCollector};

// Re-export core configuration
pub use clustermerge_core::{MergeConfig, MergePolicy, PipelineConfig};
