//! Columnar per-event record.
//!
//! `EventRecord` mirrors the on-disk schema field for field: scalar event
//! fields plus parallel per-cluster and per-cell columns (Structure of
//! Arrays). Event stores exchange this shape; the merge engine works on
//! [`Event`].

use crate::error::{Error, Result};
use crate::event::{Cell, Cluster, Event};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One event in columnar layout.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRecord {
    /// Event identifier.
    pub event_id: i32,
    /// Event timestamp.
    pub event_time: f64,
    /// Local cluster indices.
    pub cluster_index: Vec<i32>,
    /// Cell count per cluster.
    pub cluster_n_cells: Vec<i32>,
    /// Total energy per cluster.
    pub cluster_energy: Vec<f64>,
    /// Energy-weighted centroid X per cluster.
    pub cluster_weighted_x: Vec<f64>,
    /// Energy-weighted centroid Y per cluster.
    pub cluster_weighted_y: Vec<f64>,
    /// Mean timestamp per cluster.
    pub cluster_avg_t: Vec<f64>,
    /// Cell X positions.
    pub cell_x: Vec<f64>,
    /// Cell Y positions.
    pub cell_y: Vec<f64>,
    /// Cell energies.
    #[cfg_attr(feature = "serde", serde(rename = "cell_E"))]
    pub cell_e: Vec<f64>,
    /// Cell timestamps.
    #[cfg_attr(feature = "serde", serde(rename = "cell_T"))]
    pub cell_t: Vec<f64>,
    /// Cell back-references into `cluster_index`.
    pub cell_cluster_id: Vec<i32>,
}

impl EventRecord {
    /// Returns the number of clusters (length of `cluster_index`).
    #[must_use]
    pub fn cluster_len(&self) -> usize {
        self.cluster_index.len()
    }

    /// Returns the number of cells (length of `cell_x`).
    #[must_use]
    pub fn cell_len(&self) -> usize {
        self.cell_x.len()
    }

    fn check_columns(&self) -> Result<()> {
        let clusters = self.cluster_len();
        let cells = self.cell_len();
        let columns: [(&'static str, usize, usize); 10] = [
            ("cluster_n_cells", self.cluster_n_cells.len(), clusters),
            ("cluster_energy", self.cluster_energy.len(), clusters),
            ("cluster_weighted_x", self.cluster_weighted_x.len(), clusters),
            ("cluster_weighted_y", self.cluster_weighted_y.len(), clusters),
            ("cluster_avg_t", self.cluster_avg_t.len(), clusters),
            ("cell_y", self.cell_y.len(), cells),
            ("cell_E", self.cell_e.len(), cells),
            ("cell_T", self.cell_t.len(), cells),
            ("cell_cluster_id", self.cell_cluster_id.len(), cells),
            ("cell_x", self.cell_x.len(), cells),
        ];

        for (column, actual, expected) in columns {
            if actual != expected {
                return Err(Error::ColumnLengthMismatch {
                    event_id: self.event_id,
                    column,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        let clusters = &event.clusters;
        let cells = &event.cells;
        Self {
            event_id: event.id,
            event_time: event.time,
            cluster_index: clusters.iter().map(|c| c.index).collect(),
            cluster_n_cells: clusters
                .iter()
                .map(|c| i32::try_from(c.n_cells).unwrap_or(i32::MAX))
                .collect(),
            cluster_energy: clusters.iter().map(|c| c.energy).collect(),
            cluster_weighted_x: clusters.iter().map(|c| c.weighted_x).collect(),
            cluster_weighted_y: clusters.iter().map(|c| c.weighted_y).collect(),
            cluster_avg_t: clusters.iter().map(|c| c.avg_t).collect(),
            cell_x: cells.iter().map(|c| c.x).collect(),
            cell_y: cells.iter().map(|c| c.y).collect(),
            cell_e: cells.iter().map(|c| c.energy).collect(),
            cell_t: cells.iter().map(|c| c.time).collect(),
            cell_cluster_id: cells.iter().map(|c| c.cluster_id).collect(),
        }
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = Error;

    fn try_from(record: EventRecord) -> Result<Self> {
        record.check_columns()?;

        let mut clusters = Vec::with_capacity(record.cluster_len());
        for i in 0..record.cluster_len() {
            let raw = record.cluster_n_cells[i];
            let n_cells = u32::try_from(raw).map_err(|_| Error::InvalidField {
                event_id: record.event_id,
                field: "cluster_n_cells",
                value: i64::from(raw),
            })?;
            clusters.push(Cluster::new(
                record.cluster_index[i],
                n_cells,
                record.cluster_energy[i],
                record.cluster_weighted_x[i],
                record.cluster_weighted_y[i],
                record.cluster_avg_t[i],
            ));
        }

        let cells = (0..record.cell_len())
            .map(|i| {
                Cell::new(
                    record.cell_x[i],
                    record.cell_y[i],
                    record.cell_e[i],
                    record.cell_t[i],
                    record.cell_cluster_id[i],
                )
            })
            .collect();

        Ok(Event::new(record.event_id, record.event_time, clusters, cells))
    }
}
