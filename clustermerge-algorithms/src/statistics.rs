//! Energy statistics over consolidated events.
//!
//! The collector only aggregates: it takes the counters and flattened
//! cluster energies from pipeline reports and exposes a summary and a
//! fixed-width histogram for external reporting.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::pipeline::PipelineReport;
use clustermerge_core::{Error, Event, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Summary of one or more pipeline runs.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    pub total_events: usize,
    pub discarded_events: usize,
    pub rejected_events: usize,
    pub merged_clusters: usize,
    pub degenerate_merges: usize,
    /// Surviving clusters.
    pub cluster_count: usize,
    /// `None` when no cluster survived.
    pub mean_energy: Option<f64>,
    pub min_energy: Option<f64>,
    pub max_energy: Option<f64>,
}

/// Accumulates counters and cluster energies.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    total_events: usize,
    discarded_events: usize,
    rejected_events: usize,
    merged_clusters: usize,
    degenerate_merges: usize,
    energies: Vec<f64>,
}

impl StatisticsCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects cluster energies from events that were not merged.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let mut collector = Self::new();
        collector.total_events = events.len();
        collector.energies = events
            .iter()
            .flat_map(|event| event.clusters.iter().map(|cluster| cluster.energy))
            .collect();
        collector
    }

    /// Adds the counters and energies of a pipeline run.
    pub fn record(&mut self, report: &PipelineReport) {
        self.total_events += report.total_events;
        self.discarded_events += report.discarded_events;
        self.rejected_events += report.rejected.len();
        self.merged_clusters += report.merged_clusters;
        self.degenerate_merges += report.degenerate_merges;
        self.energies.extend_from_slice(&report.energies);
    }

    /// Flattened cluster energies in collection order.
    #[must_use]
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Number of energies inside the closed window `[low, high]`.
    #[must_use]
    pub fn count_in(&self, low: f64, high: f64) -> usize {
        self.energies
            .iter()
            .filter(|&&energy| energy >= low && energy <= high)
            .count()
    }

    /// Computes the run summary.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let count = self.energies.len();
        let mean_energy = if count == 0 {
            None
        } else {
            Some(self.energies.iter().sum::<f64>() / count as f64)
        };

        RunSummary {
            total_events: self.total_events,
            discarded_events: self.discarded_events,
            rejected_events: self.rejected_events,
            merged_clusters: self.merged_clusters,
            degenerate_merges: self.degenerate_merges,
            cluster_count: count,
            mean_energy,
            min_energy: self.energies.iter().copied().reduce(f64::min),
            max_energy: self.energies.iter().copied().reduce(f64::max),
        }
    }

    /// Bins the collected energies.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for an invalid binning.
    pub fn histogram(&self, bins: usize, low: f64, high: f64) -> Result<EnergyHistogram> {
        let mut histogram = EnergyHistogram::new(bins, low, high)?;
        histogram.fill_all(self.energies.iter().copied());
        Ok(histogram)
    }
}

/// Fixed-width one-dimensional histogram.
///
/// Bins are half-open `[edge, edge + width)` except the last, which also
/// includes `high`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnergyHistogram {
    low: f64,
    high: f64,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
}

impl Default for EnergyHistogram {
    fn default() -> Self {
        Self {
            low: 0.0,
            high: 500.0,
            counts: vec![0; 100],
            underflow: 0,
            overflow: 0,
        }
    }
}

impl EnergyHistogram {
    /// Creates an empty histogram.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `bins` is zero or the range is empty.
    pub fn new(bins: usize, low: f64, high: f64) -> Result<Self> {
        if bins == 0 {
            return Err(Error::Config("histogram needs at least one bin".into()));
        }
        if !(low.is_finite() && high.is_finite() && high > low) {
            return Err(Error::Config(format!(
                "invalid histogram range [{low}, {high}]"
            )));
        }
        Ok(Self {
            low,
            high,
            counts: vec![0; bins],
            underflow: 0,
            overflow: 0,
        })
    }

    /// Width of one bin.
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.counts.len() as f64
    }

    /// Lower edge of bin `bin`.
    #[must_use]
    pub fn bin_low(&self, bin: usize) -> f64 {
        self.low + bin as f64 * self.bin_width()
    }

    /// Adds one value. NaN is ignored.
    pub fn fill(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        if value < self.low {
            self.underflow += 1;
        } else if value > self.high {
            self.overflow += 1;
        } else {
            let last = self.counts.len() - 1;
            let bin = (((value - self.low) / self.bin_width()) as usize).min(last);
            self.counts[bin] += 1;
        }
    }

    /// Adds every value of an iterator.
    pub fn fill_all<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        for value in values {
            self.fill(value);
        }
    }

    /// Per-bin counts.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[must_use]
    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    #[must_use]
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Entries inside the range.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn report(energies: Vec<f64>) -> PipelineReport {
        PipelineReport {
            total_events: 5,
            discarded_events: 2,
            merged_clusters: 3,
            energies,
            ..PipelineReport::default()
        }
    }

    #[test]
    fn test_summary_over_runs() {
        let mut collector = StatisticsCollector::new();
        collector.record(&report(vec![10.0, 50.0]));
        collector.record(&report(vec![60.0]));

        let summary = collector.summary();
        assert_eq!(summary.total_events, 10);
        assert_eq!(summary.discarded_events, 4);
        assert_eq!(summary.merged_clusters, 6);
        assert_eq!(summary.cluster_count, 3);
        assert_relative_eq!(summary.mean_energy.unwrap(), 40.0);
        assert_eq!(summary.min_energy, Some(10.0));
        assert_eq!(summary.max_energy, Some(60.0));
        assert_eq!(collector.energies(), &[10.0, 50.0, 60.0]);
    }

    #[test]
    fn test_empty_summary_has_no_mean() {
        let summary = StatisticsCollector::new().summary();
        assert_eq!(summary.cluster_count, 0);
        assert!(summary.mean_energy.is_none());
        assert!(summary.min_energy.is_none());
    }

    #[test]
    fn test_count_in_window_is_closed() {
        let mut collector = StatisticsCollector::new();
        collector.record(&report(vec![39.9, 40.0, 55.0, 70.0, 70.1]));
        assert_eq!(collector.count_in(40.0, 70.0), 3);
    }

    #[test]
    fn test_histogram_binning() {
        let mut histogram = EnergyHistogram::new(4, 0.0, 40.0).unwrap();
        histogram.fill_all([-1.0, 0.0, 9.99, 10.0, 39.0, 40.0, 41.0, f64::NAN]);

        assert_eq!(histogram.counts(), &[2, 1, 0, 2]);
        assert_eq!(histogram.underflow(), 1);
        assert_eq!(histogram.overflow(), 1);
        assert_eq!(histogram.entries(), 5);
        assert_relative_eq!(histogram.bin_width(), 10.0);
        assert_relative_eq!(histogram.bin_low(3), 30.0);
    }

    #[test]
    fn test_histogram_rejects_bad_binning() {
        assert!(EnergyHistogram::new(0, 0.0, 1.0).is_err());
        assert!(EnergyHistogram::new(10, 5.0, 5.0).is_err());
        assert!(StatisticsCollector::new().histogram(10, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_default_histogram_shape() {
        let histogram = EnergyHistogram::default();
        assert_eq!(histogram.counts().len(), 100);
        assert_relative_eq!(histogram.bin_width(), 5.0);
    }
}
