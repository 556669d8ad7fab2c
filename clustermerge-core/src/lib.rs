//! clustermerge-core: Core types for detector event consolidation.
//!
//! This crate provides the event / cluster / cell data model, the
//! columnar per-event record exchanged with event stores, merge
//! configuration, and the shared error taxonomy.
//!

pub mod config;
pub mod error;
pub mod event;
pub mod record;

pub use config::{MergeConfig, MergePolicy, PipelineConfig};
pub use error::{Error, Result};
pub use event::{Cell, Cluster, Event};
pub use record::EventRecord;
