//! Minimum-energy merge policy.
//!
//! Only the lowest-energy cluster of an event is considered. If it is
//! noise it merges into the in-window cluster with the smallest time
//! difference, chosen among all other clusters. At most one merge happens
//! per event.

use crate::engine::{EventMerger, MergeOutcome};
use crate::state::{triage, MergeState, Targets, Triage};
use clustermerge_core::{Event, MergeConfig, Result};
use log::debug;

/// Merges the single minimum-energy cluster of each event.
#[derive(Clone, Debug, Default)]
pub struct MinimumEnergyMerger {
    config: MergeConfig,
}

impl MinimumEnergyMerger {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }
}

/// Lowest-energy live slot; ties resolve to the lower original index.
fn minimum_energy_slot(state: &MergeState) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for slot in (0..state.len()).filter(|&s| state.is_live(s)) {
        let energy = state.cluster(slot).energy;
        match best {
            Some((_, lowest)) if energy >= lowest || energy.is_nan() => {}
            _ => best = Some((slot, energy)),
        }
    }
    best.map(|(slot, _)| slot)
}

impl EventMerger for MinimumEnergyMerger {
    fn name(&self) -> &'static str {
        "MinimumEnergy"
    }

    fn config(&self) -> &MergeConfig {
        &self.config
    }

    fn merge(&self, event: Event) -> Result<MergeOutcome> {
        let mut state = match triage(event, &self.config)? {
            Triage::Done(outcome) => return Ok(outcome),
            Triage::Merge(state) => state,
        };

        if let Some(source) = minimum_energy_slot(&state).filter(|&s| state.is_noise(s)) {
            if let Some((target, dt)) = state.nearest_target(source, Targets::Any, &self.config) {
                debug!(
                    "event {}: merging minimum-energy cluster {} into {} (dt = {dt})",
                    state.event_id(),
                    state.cluster(source).index,
                    state.cluster(target).index
                );
                state.merge(source, target);
            }
        }

        state.finish()
    }
}
