//! Taxonomy-driven test data generation.
//!
//! Resolves a named, hierarchical dataset taxonomy (e.g. geographic regions:
//! world → continent → country) into a tree of weighted data generators and
//! answers two kinds of requests: a random value from anywhere under a root,
//! weighted by configured importance per hierarchy level, and a value for a
//! specific dataset, substituting a nearby alternate when that dataset has
//! no data.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dataforge::{DatasetTreeBuilder, HierarchyRegistry, StaticHierarchySource};
//! # use dataforge::{ApplicationResult, AtomicFactory, DatasetInfo, ValueGenerator};
//! # struct Names;
//! # impl AtomicFactory<String> for Names {
//! #     fn create(&self, _: &DatasetInfo) -> ApplicationResult<Option<Box<dyn ValueGenerator<String>>>> { Ok(None) }
//! # }
//!
//! let source = StaticHierarchySource::new().with("region", "dach = DE, AT, CH");
//! let registry = Arc::new(HierarchyRegistry::new(Arc::new(source)));
//! let mut builder = DatasetTreeBuilder::new(registry, Arc::new(Names), "region", "dach", true);
//! builder.init()?;
//! let mut rng = rand::thread_rng();
//! let generated = builder.generate(&mut rng)?;
//! println!("{} from {}", generated.value, generated.origin);
//! # Ok::<(), dataforge::ApplicationError>(())
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod util;

pub use application::region::{
    current_region, push_region, with_region, RegionGuard, DEFAULT_REGION,
};
pub use application::services::{AtomicFactory, DatasetTreeBuilder, HierarchyRegistry};
pub use application::{ApplicationError, ApplicationResult};
pub use config::Settings;
pub use domain::{
    AtomicDatasetGenerator, CompositeDatasetGenerator, DatasetGenerator, DatasetGraph,
    DatasetInfo, DatasetNode, DomainError, DomainResult, Generated, Provenance, ValueGenerator,
    WeightedEntry, WeightedSelector, DEFAULT_WEIGHT,
};
pub use infrastructure::{FileHierarchySource, HierarchySource, StaticHierarchySource};
