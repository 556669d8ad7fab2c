//! Event, cluster and cell types.
//!
//! An [`Event`] owns two flat sequences: its clusters and its cells. Cells
//! are not nested inside clusters; each cell carries a `cluster_id`
//! back-reference into the event's cluster index space, and that
//! back-reference is the only record of group membership.

use crate::error::{Error, Result};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single detector hit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Deposited energy.
    pub energy: f64,
    /// Hit timestamp.
    pub time: f64,
    /// Index of the owning cluster within the same event.
    pub cluster_id: i32,
}

impl Cell {
    /// Creates a new cell.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, energy: f64, time: f64, cluster_id: i32) -> Self {
        Self {
            x,
            y,
            energy,
            time,
            cluster_id,
        }
    }
}

/// Aggregate record for a group of cells.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Local index, unique within the event.
    pub index: i32,
    /// Number of constituent cells.
    pub n_cells: u32,
    /// Total energy of constituent cells.
    pub energy: f64,
    /// Energy-weighted centroid X.
    pub weighted_x: f64,
    /// Energy-weighted centroid Y.
    pub weighted_y: f64,
    /// Mean timestamp of constituent cells.
    pub avg_t: f64,
}

impl Cluster {
    /// Creates a cluster record from precomputed attributes.
    #[must_use]
    pub fn new(
        index: i32,
        n_cells: u32,
        energy: f64,
        weighted_x: f64,
        weighted_y: f64,
        avg_t: f64,
    ) -> Self {
        Self {
            index,
            n_cells,
            energy,
            weighted_x,
            weighted_y,
            avg_t,
        }
    }

    /// Aggregates a cluster record from its cells.
    ///
    /// The centroid is energy-weighted. If the cells carry no energy the
    /// centroid falls back to the arithmetic mean of positions; an empty
    /// set yields a zeroed record.
    #[must_use]
    pub fn from_cells<'a, I>(index: i32, cells: I) -> Self
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut n = 0u32;
        let mut sum_e = 0.0;
        let mut sum_xe = 0.0;
        let mut sum_ye = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_t = 0.0;

        for cell in cells {
            n += 1;
            sum_e += cell.energy;
            sum_xe += cell.x * cell.energy;
            sum_ye += cell.y * cell.energy;
            sum_x += cell.x;
            sum_y += cell.y;
            sum_t += cell.time;
        }

        if n == 0 {
            return Self::new(index, 0, 0.0, 0.0, 0.0, 0.0);
        }

        let count = f64::from(n);
        let (weighted_x, weighted_y) = if sum_e > 0.0 {
            (sum_xe / sum_e, sum_ye / sum_e)
        } else {
            (sum_x / count, sum_y / count)
        };

        Self::new(index, n, sum_e, weighted_x, weighted_y, sum_t / count)
    }
}

/// One timestamped detector snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    /// Event identifier.
    pub id: i32,
    /// Event timestamp.
    pub time: f64,
    /// Clusters of this event.
    pub clusters: Vec<Cluster>,
    /// Flat cell list of this event.
    pub cells: Vec<Cell>,
}

impl Event {
    /// Creates an event from its clusters and cells.
    #[must_use]
    pub fn new(id: i32, time: f64, clusters: Vec<Cluster>, cells: Vec<Cell>) -> Self {
        Self {
            id,
            time,
            clusters,
            cells,
        }
    }

    /// Returns the number of clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Returns the number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterates over the cells whose back-reference equals `index`.
    pub fn cells_of(&self, index: i32) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(move |cell| cell.cluster_id == index)
    }

    /// Looks up a cluster by its local index.
    #[must_use]
    pub fn cluster(&self, index: i32) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.index == index)
    }

    /// Sum of all cell energies.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.cells.iter().map(|cell| cell.energy).sum()
    }

    /// Sum of the reported cluster energies.
    #[must_use]
    pub fn cluster_energy_sum(&self) -> f64 {
        self.clusters.iter().map(|cluster| cluster.energy).sum()
    }

    /// Returns true if cluster indices are exactly `0..k`.
    #[must_use]
    pub fn has_dense_indices(&self) -> bool {
        self.clusters
            .iter()
            .enumerate()
            .all(|(position, cluster)| usize::try_from(cluster.index) == Ok(position))
    }

    /// Checks cell/cluster referential integrity.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateClusterIndex`] if two clusters share an
    /// index, or [`Error::DanglingCellReference`] for the first cell whose
    /// back-reference does not resolve.
    pub fn validate(&self) -> Result<()> {
        let mut indices = HashSet::with_capacity(self.clusters.len());
        for cluster in &self.clusters {
            if !indices.insert(cluster.index) {
                return Err(Error::DuplicateClusterIndex {
                    event_id: self.id,
                    index: cluster.index,
                });
            }
        }

        for (cell, hit) in self.cells.iter().enumerate() {
            if !indices.contains(&hit.cluster_id) {
                return Err(Error::DanglingCellReference {
                    event_id: self.id,
                    cell,
                    cluster_id: hit.cluster_id,
                });
            }
        }

        Ok(())
    }
}
