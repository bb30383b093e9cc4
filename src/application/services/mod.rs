//! Application services
//!
//! Concrete service implementations that orchestrate domain logic. Services
//! depend on the hierarchy-source boundary trait and the caller-supplied
//! atomic factory, but are themselves concrete structs, not traits.

mod builder;
mod registry;

pub use builder::{AtomicFactory, DatasetTreeBuilder};
pub use registry::HierarchyRegistry;
