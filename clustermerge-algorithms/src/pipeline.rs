//! Event consolidation pipeline.
//!
//! Drives a merge engine over a sequence of events and folds the results
//! into a [`PipelineReport`]. Parallel runs shard events across the rayon
//! pool and fold in input order, so both modes produce the same report.

use crate::engine::{merger_for, DiscardReason, EventMerger, MergeOutcome};
use clustermerge_core::{Error, Event, MergeConfig, PipelineConfig, Result};
use log::{info, warn};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Discarded events broken down by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscardCounts {
    pub no_clusters: usize,
    pub single_low_cluster: usize,
    pub all_clusters_removed: usize,
}

impl DiscardCounts {
    fn record(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::NoClusters => self.no_clusters += 1,
            DiscardReason::SingleLowCluster => self.single_low_cluster += 1,
            DiscardReason::AllClustersRemoved => self.all_clusters_removed += 1,
        }
    }

    /// Sum over all reasons.
    #[must_use]
    pub fn total(&self) -> usize {
        self.no_clusters + self.single_low_cluster + self.all_clusters_removed
    }
}

/// An event skipped because of an integrity error.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEvent {
    pub event_id: i32,
    pub error: Error,
}

/// Aggregated result of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    /// Events read.
    pub total_events: usize,
    /// Events dropped by the engine.
    pub discarded_events: usize,
    /// Discards broken down by reason.
    pub discard_reasons: DiscardCounts,
    /// Noise clusters merged, over all events.
    pub merged_clusters: usize,
    /// Merges recovered from a non-positive combined energy.
    pub degenerate_merges: usize,
    /// Events skipped for integrity errors.
    pub rejected: Vec<RejectedEvent>,
    /// Consolidated events in input order.
    pub events: Vec<Event>,
    /// Final energy of every surviving cluster, event by event.
    pub energies: Vec<f64>,
}

impl PipelineReport {
    /// Number of surviving clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.energies.len()
    }

    fn absorb(
        &mut self,
        event_id: i32,
        outcome: Result<MergeOutcome>,
        fail_fast: bool,
    ) -> Result<()> {
        self.total_events += 1;
        match outcome {
            Ok(MergeOutcome::Consolidated { event, stats }) => {
                self.merged_clusters += stats.merges;
                self.degenerate_merges += stats.degenerate_merges;
                self.energies
                    .extend(event.clusters.iter().map(|cluster| cluster.energy));
                self.events.push(event);
            }
            Ok(MergeOutcome::Discarded(reason)) => {
                self.discarded_events += 1;
                self.discard_reasons.record(reason);
            }
            Err(error) if error.is_integrity() && !fail_fast => {
                warn!("skipping event {event_id}: {error}");
                self.rejected.push(RejectedEvent { event_id, error });
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }
}

/// Runs the merge engine over many events.
pub struct ConsolidationPipeline {
    merger: Box<dyn EventMerger>,
    config: PipelineConfig,
}

impl ConsolidationPipeline {
    /// Builds a pipeline for the configured policy.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the merge thresholds are invalid.
    pub fn new(merge: MergeConfig, config: PipelineConfig) -> Result<Self> {
        merge.validate()?;
        Ok(Self {
            merger: merger_for(config.policy, merge),
            config,
        })
    }

    /// Builds a pipeline around an existing engine.
    #[must_use]
    pub fn with_merger(merger: Box<dyn EventMerger>, config: PipelineConfig) -> Self {
        Self { merger, config }
    }

    /// Returns the engine in use.
    #[must_use]
    pub fn merger(&self) -> &dyn EventMerger {
        self.merger.as_ref()
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Consolidates all events.
    ///
    /// # Errors
    /// With `fail_fast`, returns the first integrity error in input order.
    /// Other errors always abort the run.
    pub fn run<I>(&self, events: I) -> Result<PipelineReport>
    where
        I: IntoIterator<Item = Event>,
    {
        let fail_fast = self.config.fail_fast;
        let mut report = PipelineReport::default();

        if self.config.parallel {
            let events: Vec<Event> = events.into_iter().collect();
            let outcomes: Vec<(i32, Result<MergeOutcome>)> = events
                .into_par_iter()
                .map(|event| (event.id, self.merger.merge(event)))
                .collect();
            for (event_id, outcome) in outcomes {
                report.absorb(event_id, outcome, fail_fast)?;
            }
        } else {
            for event in events {
                let event_id = event.id;
                report.absorb(event_id, self.merger.merge(event), fail_fast)?;
            }
        }

        info!(
            "{}: {} events, {} discarded, {} rejected, {} merges",
            self.merger.name(),
            report.total_events,
            report.discarded_events,
            report.rejected.len(),
            report.merged_clusters
        );
        Ok(report)
    }
}
