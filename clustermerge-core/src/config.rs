//! Merge and pipeline configuration.

use crate::error::{Error, Result};
use crate::event::Cluster;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Thresholds used by the cluster merge engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MergeConfig {
    /// A noise cluster has at most this many cells.
    pub max_low_cells: u32,
    /// A noise cluster has strictly less energy than this.
    pub low_energy_threshold: f64,
    /// Maximum |dx| between a noise cluster and a merge target.
    pub window_x: f64,
    /// Maximum |dy| between a noise cluster and a merge target.
    pub window_y: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_low_cells: 2,
            low_energy_threshold: 30.0,
            window_x: 10.0,
            window_y: 10.0,
        }
    }
}

impl MergeConfig {
    /// Creates a configuration with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum cell count of a noise cluster.
    #[must_use]
    pub fn with_max_low_cells(mut self, cells: u32) -> Self {
        self.max_low_cells = cells;
        self
    }

    /// Sets the energy threshold of a noise cluster.
    #[must_use]
    pub fn with_low_energy_threshold(mut self, energy: f64) -> Self {
        self.low_energy_threshold = energy;
        self
    }

    /// Sets the per-axis search window.
    #[must_use]
    pub fn with_window(mut self, window_x: f64, window_y: f64) -> Self {
        self.window_x = window_x;
        self.window_y = window_y;
        self
    }

    /// Noise predicate: few cells and little energy.
    #[inline]
    #[must_use]
    pub fn is_noise(&self, cluster: &Cluster) -> bool {
        cluster.n_cells <= self.max_low_cells && cluster.energy < self.low_energy_threshold
    }

    /// Per-axis window test; not a Euclidean radius.
    #[inline]
    #[must_use]
    pub fn in_window(&self, dx: f64, dy: f64) -> bool {
        dx <= self.window_x && dy <= self.window_y
    }

    /// Checks that thresholds are usable.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for negative or non-finite values.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("low_energy_threshold", self.low_energy_threshold),
            ("window_x", self.window_x),
            ("window_y", self.window_y),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Strategy for choosing which noise clusters to merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MergePolicy {
    /// Every noise cluster is merged into its nearest normal cluster.
    #[default]
    EachLow,
    /// Only the minimum-energy cluster of each event is a merge candidate.
    MinimumEnergy,
}

/// Settings for driving the engine over many events.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Abort the run on the first integrity error instead of skipping the event.
    pub fail_fast: bool,
    /// Shard events across the rayon thread pool.
    pub parallel: bool,
    /// Merge policy applied to each event.
    pub policy: MergePolicy,
}

impl PipelineConfig {
    /// Creates a sequential, non-fail-fast configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets fail-fast behaviour.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Enables or disables parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the merge policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_config_defaults() {
        let config = MergeConfig::default();
        assert_eq!(config.max_low_cells, 2);
        assert!((config.low_energy_threshold - 30.0).abs() < f64::EPSILON);
        assert!((config.window_x - 10.0).abs() < f64::EPSILON);
        assert!((config.window_y - 10.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_noise_predicate_boundaries() {
        let config = MergeConfig::default();
        let noise = Cluster::new(0, 2, 29.9, 0.0, 0.0, 0.0);
        let too_many_cells = Cluster::new(0, 3, 20.0, 0.0, 0.0, 0.0);
        let at_threshold = Cluster::new(0, 1, 30.0, 0.0, 0.0, 0.0);

        assert!(config.is_noise(&noise));
        assert!(!config.is_noise(&too_many_cells));
        assert!(!config.is_noise(&at_threshold));
    }

    #[test]
    fn test_window_is_per_axis() {
        let config = MergeConfig::default();
        // Euclidean distance ~14.1 is still inside
        assert!(config.in_window(10.0, 10.0));
        assert!(!config.in_window(10.5, 0.0));
        assert!(!config.in_window(0.0, 10.01));
    }

    #[test]
    fn test_builders() {
        let config = MergeConfig::new()
            .with_max_low_cells(3)
            .with_low_energy_threshold(25.0)
            .with_window(5.0, 7.5);
        assert_eq!(config.max_low_cells, 3);
        assert!((config.window_y - 7.5).abs() < f64::EPSILON);

        let pipeline = PipelineConfig::new()
            .with_fail_fast(true)
            .with_parallel(true)
            .with_policy(MergePolicy::MinimumEnergy);
        assert!(pipeline.fail_fast);
        assert!(pipeline.parallel);
        assert_eq!(pipeline.policy, MergePolicy::MinimumEnergy);
    }

    #[test]
    fn test_validate_rejects_negative_window() {
        let config = MergeConfig::new().with_window(-1.0, 10.0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = MergeConfig::new().with_low_energy_threshold(f64::NAN);
        assert!(config.validate().is_err());
    }
}
