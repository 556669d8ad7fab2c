//! Per-event working state for the merge engines.
//!
//! Clusters live in an arena of slots ordered by ascending original index.
//! A slot keeps its original index for the whole pass; cells point at
//! slots, not at indices. Merges only rewrite slot attributes and cell
//! owners, and the dense output numbering is computed once in
//! [`MergeState::finish`].

use crate::engine::{DiscardReason, MergeOutcome, MergeStatistics};
use clustermerge_core::{Cell, Cluster, Error, Event, MergeConfig, Result};
use log::debug;

/// Which clusters may absorb a noise cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Targets {
    /// Only clusters that were not noise at the start of the pass.
    Normal,
    /// Any cluster still present.
    Any,
}

#[derive(Debug, Clone)]
struct Slot {
    cluster: Cluster,
    noise: bool,
    merged_into: Option<usize>,
}

/// Exclusive working copy of one event.
#[derive(Debug)]
pub(crate) struct MergeState {
    event_id: i32,
    event_time: f64,
    slots: Vec<Slot>,
    cells: Vec<Cell>,
    owners: Vec<usize>,
    stats: MergeStatistics,
}

/// Result of screening an event before any merge is attempted.
pub(crate) enum Triage {
    /// Outcome decided without merging.
    Done(MergeOutcome),
    /// Two or more clusters: merging required.
    Merge(MergeState),
}

impl MergeState {
    /// Takes ownership of an event, validating cell back-references.
    ///
    /// Noise flags are evaluated once here against the input attributes.
    pub(crate) fn new(event: Event, config: &MergeConfig) -> Result<Self> {
        let Event {
            id,
            time,
            mut clusters,
            cells,
        } = event;

        clusters.sort_by_key(|cluster| cluster.index);
        if let Some(pair) = clusters.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(Error::DuplicateClusterIndex {
                event_id: id,
                index: pair[0].index,
            });
        }

        let mut owners = Vec::with_capacity(cells.len());
        for (position, cell) in cells.iter().enumerate() {
            let slot = clusters
                .binary_search_by_key(&cell.cluster_id, |cluster| cluster.index)
                .map_err(|_| Error::DanglingCellReference {
                    event_id: id,
                    cell: position,
                    cluster_id: cell.cluster_id,
                })?;
            owners.push(slot);
        }

        let stats = MergeStatistics {
            clusters_in: clusters.len(),
            ..MergeStatistics::default()
        };
        let slots = clusters
            .into_iter()
            .map(|cluster| Slot {
                noise: config.is_noise(&cluster),
                cluster,
                merged_into: None,
            })
            .collect();

        Ok(Self {
            event_id: id,
            event_time: time,
            slots,
            cells,
            owners,
            stats,
        })
    }

    /// Number of cluster slots, merged ones included.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn event_id(&self) -> i32 {
        self.event_id
    }

    pub(crate) fn is_noise(&self, slot: usize) -> bool {
        self.slots[slot].noise
    }

    pub(crate) fn is_live(&self, slot: usize) -> bool {
        self.slots[slot].merged_into.is_none()
    }

    pub(crate) fn cluster(&self, slot: usize) -> &Cluster {
        &self.slots[slot].cluster
    }

    /// Slots flagged as noise, in ascending original index.
    pub(crate) fn noise_slots(&self) -> Vec<usize> {
        (0..self.slots.len()).filter(|&s| self.slots[s].noise).collect()
    }

    /// Finds the merge target for `source`.
    ///
    /// Candidates are live slots of the requested kind inside the per-axis
    /// window around the source centroid. The candidate with the smallest
    /// `|dt|` wins; on a tie the lower original index wins. Attributes are
    /// read from the current state, so earlier merges in the same pass are
    /// visible.
    pub(crate) fn nearest_target(
        &self,
        source: usize,
        targets: Targets,
        config: &MergeConfig,
    ) -> Option<(usize, f64)> {
        let from = &self.slots[source].cluster;
        let mut best: Option<(usize, f64)> = None;

        for (slot, candidate) in self.slots.iter().enumerate() {
            if slot == source || candidate.merged_into.is_some() {
                continue;
            }
            if targets == Targets::Normal && candidate.noise {
                continue;
            }

            let to = &candidate.cluster;
            let dx = (to.weighted_x - from.weighted_x).abs();
            let dy = (to.weighted_y - from.weighted_y).abs();
            if !config.in_window(dx, dy) {
                continue;
            }

            let dt = (to.avg_t - from.avg_t).abs();
            match best {
                Some((_, best_dt)) if dt >= best_dt || dt.is_nan() => {}
                _ => best = Some((slot, dt)),
            }
        }

        best
    }

    /// Merges `source` into `target`.
    ///
    /// The target is recomputed from the union of both cell sets. If the
    /// union carries no positive energy the centroid (and, for an empty
    /// union, the time and cell count) fall back to the source attributes.
    pub(crate) fn merge(&mut self, source: usize, target: usize) {
        debug_assert_ne!(source, target);

        let mut n = 0u32;
        let mut sum_e = 0.0;
        let mut sum_xe = 0.0;
        let mut sum_ye = 0.0;
        let mut sum_t = 0.0;

        for (cell, &owner) in self.cells.iter().zip(&self.owners) {
            if owner == source || owner == target {
                n += 1;
                sum_e += cell.energy;
                sum_xe += cell.x * cell.energy;
                sum_ye += cell.y * cell.energy;
                sum_t += cell.time;
            }
        }

        let fallback = self.slots[source].cluster;
        let merged = &mut self.slots[target].cluster;
        merged.energy = sum_e;

        if sum_e > 0.0 {
            merged.n_cells = n;
            merged.weighted_x = sum_xe / sum_e;
            merged.weighted_y = sum_ye / sum_e;
            merged.avg_t = sum_t / f64::from(n);
        } else {
            debug!(
                "event {}: merged energy of cluster {} is {sum_e}, keeping centroid of cluster {}",
                self.event_id, merged.index, fallback.index
            );
            merged.weighted_x = fallback.weighted_x;
            merged.weighted_y = fallback.weighted_y;
            if n > 0 {
                merged.n_cells = n;
                merged.avg_t = sum_t / f64::from(n);
            } else {
                merged.n_cells = fallback.n_cells;
                merged.avg_t = fallback.avg_t;
            }
            self.stats.degenerate_merges += 1;
        }

        for owner in &mut self.owners {
            if *owner == source {
                *owner = target;
            }
        }

        self.slots[source].merged_into = Some(target);
        self.stats.merges += 1;
    }

    /// Drops merged slots and renumbers survivors densely.
    ///
    /// Survivors keep their relative original-index order and receive
    /// indices `0..k`. Every cell back-reference is rewritten in a single
    /// pass. An event with no survivors is discarded.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub(crate) fn finish(self) -> Result<MergeOutcome> {
        let Self {
            event_id,
            event_time,
            slots,
            mut cells,
            owners,
            mut stats,
        } = self;

        let mut dense = vec![None; slots.len()];
        let mut clusters = Vec::with_capacity(slots.len());
        for (slot, entry) in slots.iter().enumerate() {
            if entry.merged_into.is_some() {
                continue;
            }
            // Survivors are distinct i32 indices, so the count fits.
            let index = clusters.len() as i32;
            dense[slot] = Some(index);
            clusters.push(Cluster {
                index,
                ..entry.cluster
            });
        }

        if clusters.is_empty() {
            debug!("event {event_id}: discarded, no cluster survived merging");
            return Ok(MergeOutcome::Discarded(DiscardReason::AllClustersRemoved));
        }

        for (position, (cell, owner)) in cells.iter_mut().zip(owners).enumerate() {
            cell.cluster_id = dense[owner].ok_or(Error::DanglingCellReference {
                event_id,
                cell: position,
                cluster_id: slots[owner].cluster.index,
            })?;
        }

        stats.clusters_out = clusters.len();
        Ok(MergeOutcome::Consolidated {
            event: Event::new(event_id, event_time, clusters, cells),
            stats,
        })
    }
}

/// Validates an event and settles the zero- and one-cluster cases.
pub(crate) fn triage(event: Event, config: &MergeConfig) -> Result<Triage> {
    let state = MergeState::new(event, config)?;
    let reason = match state.len() {
        0 => DiscardReason::NoClusters,
        1 if state.is_noise(0) => DiscardReason::SingleLowCluster,
        1 => return state.finish().map(Triage::Done),
        _ => return Ok(Triage::Merge(state)),
    };
    debug!("event {}: discarded ({reason:?})", state.event_id);
    Ok(Triage::Done(MergeOutcome::Discarded(reason)))
}
