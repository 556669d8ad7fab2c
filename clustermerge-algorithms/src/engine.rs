//! Merge engine interface and outcome types.

use crate::{MinimumEnergyMerger, NearestNormalMerger};
use clustermerge_core::{Event, MergeConfig, MergePolicy, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiscardReason {
    /// The event carried no clusters.
    NoClusters,
    /// The only cluster of the event is noise.
    SingleLowCluster,
    /// No cluster survived merging.
    AllClustersRemoved,
}

/// Counters for one consolidated event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeStatistics {
    /// Noise clusters merged into another cluster.
    pub merges: usize,
    /// Merges whose combined energy was not positive.
    pub degenerate_merges: usize,
    /// Clusters before merging.
    pub clusters_in: usize,
    /// Clusters after compaction.
    pub clusters_out: usize,
}

/// Result of running the engine over one event.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The event survives with dense cluster indices.
    Consolidated {
        /// The consolidated event.
        event: Event,
        /// Merge counters for this event.
        stats: MergeStatistics,
    },
    /// The event is dropped.
    Discarded(DiscardReason),
}

impl MergeOutcome {
    /// Returns true if the event was dropped.
    #[must_use]
    pub fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded(_))
    }

    /// Returns the consolidated event, if any.
    #[must_use]
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Consolidated { event, .. } => Some(event),
            Self::Discarded(_) => None,
        }
    }

    /// Consumes the outcome, returning the consolidated event.
    #[must_use]
    pub fn into_event(self) -> Option<Event> {
        match self {
            Self::Consolidated { event, .. } => Some(event),
            Self::Discarded(_) => None,
        }
    }

    /// Number of merges performed; zero for discarded events.
    #[must_use]
    pub fn merges(&self) -> usize {
        match self {
            Self::Consolidated { stats, .. } => stats.merges,
            Self::Discarded(_) => 0,
        }
    }
}

/// Trait for per-event merge engines.
///
/// An engine is a pure function of one event: it holds configuration
/// only, so a single instance can be shared across worker threads.
pub trait EventMerger: Send + Sync {
    /// Returns the name of the merge policy.
    fn name(&self) -> &'static str;

    /// Returns the active configuration.
    fn config(&self) -> &MergeConfig;

    /// Consolidates one event.
    ///
    /// # Errors
    /// Returns an integrity error if a cell references a cluster index that
    /// does not exist in the event, or if cluster indices are duplicated.
    fn merge(&self, event: Event) -> Result<MergeOutcome>;
}

/// Builds the engine for a policy.
#[must_use]
pub fn merger_for(policy: MergePolicy, config: MergeConfig) -> Box<dyn EventMerger> {
    match policy {
        MergePolicy::EachLow => Box::new(NearestNormalMerger::new(config)),
        MergePolicy::MinimumEnergy => Box::new(MinimumEnergyMerger::new(config)),
    }
}

/// Consolidates a single event with the given policy.
///
/// # Errors
/// Propagates integrity errors from the engine.
pub fn consolidate_event(
    event: Event,
    policy: MergePolicy,
    config: &MergeConfig,
) -> Result<MergeOutcome> {
    match policy {
        MergePolicy::EachLow => NearestNormalMerger::new(config.clone()).merge(event),
        MergePolicy::MinimumEnergy => MinimumEnergyMerger::new(config.clone()).merge(event),
    }
}
