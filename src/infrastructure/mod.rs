//! Infrastructure layer: hierarchy source boundary and implementations

pub mod traits;

pub use traits::{FileHierarchySource, HierarchySource, StaticHierarchySource};
