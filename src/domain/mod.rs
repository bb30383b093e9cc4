//! Domain layer: taxonomy graph, weighted selection, generator tree
//!
//! This layer is independent of external concerns (no I/O, no config
//! loading); hierarchy sources and factories are injected from above.

pub mod error;
pub mod generator;
pub mod graph;
pub mod selector;

pub use error::{DomainError, DomainResult};
pub use generator::{
    AtomicDatasetGenerator, CompositeDatasetGenerator, DatasetGenerator, Generated, Provenance,
    ValueGenerator, DEFAULT_WEIGHT,
};
pub use graph::{DatasetGraph, DatasetInfo, DatasetNode};
pub use selector::{WeightedEntry, WeightedSelector};
