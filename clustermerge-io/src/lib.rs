//! clustermerge-io: Event stores and report writers for clustermerge.
//!
//! Events are exchanged as columnar [`EventRecord`](clustermerge_core::EventRecord)s,
//! one JSON object per line. The energy writer produces the flat CSV used
//! for external histogramming and peak fitting.
//!

mod error;
pub mod jsonl;
pub mod store;
mod writer;

pub use error::{Error, Result};
pub use jsonl::{JsonLinesReader, JsonLinesStore, JsonLinesWriter};
pub use store::{consolidate_store, EventStore, MemoryEventStore};
pub use writer::EnergyCsvWriter;
