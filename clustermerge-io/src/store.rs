//! Event store abstraction.

use crate::Result;
use clustermerge_algorithms::{ConsolidationPipeline, PipelineReport};
use clustermerge_core::Event;
use log::info;

/// Supplies events to the pipeline and persists consolidated ones.
pub trait EventStore {
    /// Reads every event, in store order.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read or decoded.
    fn load(&mut self) -> Result<Vec<Event>>;

    /// Persists consolidated events, replacing previous output.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn persist(&mut self, events: &[Event]) -> Result<()>;
}

/// Store that keeps input and output in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    input: Vec<Event>,
    output: Vec<Event>,
}

impl MemoryEventStore {
    /// Creates a store serving `events`.
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            input: events,
            output: Vec::new(),
        }
    }

    /// Events persisted so far.
    #[must_use]
    pub fn output(&self) -> &[Event] {
        &self.output
    }
}

impl EventStore for MemoryEventStore {
    fn load(&mut self) -> Result<Vec<Event>> {
        Ok(self.input.clone())
    }

    fn persist(&mut self, events: &[Event]) -> Result<()> {
        self.output = events.to_vec();
        Ok(())
    }
}

/// Loads a store, consolidates every event and persists the survivors.
///
/// # Errors
/// Returns store errors, or pipeline errors when the pipeline is fail-fast.
pub fn consolidate_store<S: EventStore + ?Sized>(
    store: &mut S,
    pipeline: &ConsolidationPipeline,
) -> Result<PipelineReport> {
    let events = store.load()?;
    info!("loaded {} events", events.len());
    let report = pipeline.run(events)?;
    store.persist(&report.events)?;
    Ok(report)
}
