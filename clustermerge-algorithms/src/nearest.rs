//! Nearest-normal merge policy.
//!
//! Every noise cluster is offered to the normal clusters of its event.
//! Noise clusters are visited in ascending original index and each merge
//! updates the target in place, so later noise clusters see the shifted
//! centroid and time of targets that already absorbed something.

use crate::engine::{EventMerger, MergeOutcome};
use crate::state::{triage, Targets, Triage};
use clustermerge_core::{Event, MergeConfig, Result};
use log::debug;

/// Merges each noise cluster into the closest-in-time normal cluster
/// inside its spatial window.
#[derive(Clone, Debug, Default)]
pub struct NearestNormalMerger {
    config: MergeConfig,
}

impl NearestNormalMerger {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }
}

impl EventMerger for NearestNormalMerger {
    fn name(&self) -> &'static str {
        "NearestNormal"
    }

    fn config(&self) -> &MergeConfig {
        &self.config
    }

    fn merge(&self, event: Event) -> Result<MergeOutcome> {
        let mut state = match triage(event, &self.config)? {
            Triage::Done(outcome) => return Ok(outcome),
            Triage::Merge(state) => state,
        };

        for source in state.noise_slots() {
            let Some((target, dt)) = state.nearest_target(source, Targets::Normal, &self.config)
            else {
                continue;
            };
            debug!(
                "event {}: merging cluster {} into {} (dt = {dt})",
                state.event_id(),
                state.cluster(source).index,
                state.cluster(target).index
            );
            state.merge(source, target);
        }

        state.finish()
    }
}
