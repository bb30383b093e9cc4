//! Dataset generator tree builder and lifecycle facade.
//!
//! Mirrors the registry's taxonomy shape into a generator tree through the
//! [`AtomicFactory`] seam, pruning branches that yield nothing, then serves
//! generation requests against the cached tree.

use std::sync::Arc;

use itertools::Itertools;
use rand::RngCore;
use tracing::debug;

use crate::application::services::HierarchyRegistry;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    AtomicDatasetGenerator, CompositeDatasetGenerator, DatasetGenerator, DatasetGraph,
    DatasetInfo, DomainError, Generated, ValueGenerator, WeightedSelector,
};

/// Supplies concrete generators for atomic datasets.
///
/// Returning `Ok(None)` means "no data available, prune this branch" and is
/// recoverable at any non-required level. Returning `Err` means "data was
/// expected but the configuration is broken" and is fatal everywhere.
pub trait AtomicFactory<E>: Send + Sync {
    fn create(&self, dataset: &DatasetInfo)
        -> ApplicationResult<Option<Box<dyn ValueGenerator<E>>>>;
}

/// Builds and owns one generator tree for a root dataset.
///
/// Construction is a one-time explicit [`init`](Self::init) phase behind
/// `&mut self`; afterwards the tree is read-only and
/// [`generate`](Self::generate) / [`generate_for_dataset`](Self::generate_for_dataset)
/// may run concurrently, each caller bringing its own random source.
pub struct DatasetTreeBuilder<E> {
    registry: Arc<HierarchyRegistry>,
    factory: Arc<dyn AtomicFactory<E>>,
    nesting: String,
    root: String,
    fallback_enabled: bool,
    tree: Option<DatasetGenerator<E>>,
}

impl<E> DatasetTreeBuilder<E> {
    pub fn new(
        registry: Arc<HierarchyRegistry>,
        factory: Arc<dyn AtomicFactory<E>>,
        nesting: impl Into<String>,
        root: impl Into<String>,
        fallback_enabled: bool,
    ) -> Self {
        Self {
            registry,
            factory,
            nesting: nesting.into(),
            root: root.into(),
            fallback_enabled,
            tree: None,
        }
    }

    pub fn nesting(&self) -> &str {
        &self.nesting
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn is_initialized(&self) -> bool {
        self.tree.is_some()
    }

    /// Consult the registry once and build the tree. Idempotent.
    pub fn init(&mut self) -> ApplicationResult<()> {
        if self.tree.is_some() {
            return Ok(());
        }
        let graph = self.registry.graph(&self.nesting)?;
        debug!(nesting = %self.nesting, root = %self.root, "building generator tree");
        let tree = self
            .build_node(&graph, &self.root, true)?
            .ok_or_else(|| {
                ApplicationError::from(DomainError::NoGenerator {
                    nesting: self.nesting.clone(),
                    dataset: self.root.clone(),
                })
            })?;
        debug!(
            nesting = %self.nesting,
            root = %self.root,
            weight = tree.weight(),
            "generator tree built"
        );
        self.tree = Some(tree);
        Ok(())
    }

    /// Random value from anywhere under the root, weighted per level.
    pub fn generate(&self, rng: &mut dyn RngCore) -> ApplicationResult<Generated<E>> {
        let tree = self.tree.as_ref().ok_or(DomainError::NotInitialized)?;
        Ok(tree.generate(rng)?)
    }

    /// Value specifically for `name`, falling back where configured.
    pub fn generate_for_dataset(
        &self,
        name: &str,
        rng: &mut dyn RngCore,
    ) -> ApplicationResult<Generated<E>> {
        let tree = self.tree.as_ref().ok_or(DomainError::NotInitialized)?;
        Ok(tree.generate_for_dataset(name, rng)?)
    }

    /// The cached tree, for inspection and diagnostics rendering.
    pub fn tree(&self) -> Option<&DatasetGenerator<E>> {
        self.tree.as_ref()
    }

    /// Total weight of the root selector, or the root's own weight for an
    /// atomic root.
    pub fn total_weight(&self) -> Option<f64> {
        self.tree.as_ref().map(|t| match t {
            DatasetGenerator::Atomic(a) => a.weight(),
            DatasetGenerator::Composite(c) => c.weight(),
        })
    }

    /// Propagate close to every retained leaf generator and drop the tree.
    pub fn close(&mut self) {
        if let Some(tree) = self.tree.take() {
            tree.close();
        }
    }

    fn build_node(
        &self,
        graph: &Arc<DatasetGraph>,
        name: &str,
        required: bool,
    ) -> ApplicationResult<Option<DatasetGenerator<E>>> {
        let subsets = graph
            .get(name)
            .map(|idx| graph.subset_names(idx))
            .unwrap_or_default();

        if subsets.is_empty() {
            return self.build_atomic(name, required);
        }

        let mut children = WeightedSelector::new();
        let mut pruned = Vec::new();
        for subset in &subsets {
            match self.build_node(graph, subset, false)? {
                Some(child) => {
                    let weight = child.weight();
                    children.add(child, weight);
                }
                None => pruned.push(subset.as_str()),
            }
        }
        if !pruned.is_empty() {
            debug!(
                nesting = %self.nesting,
                dataset = name,
                pruned = %pruned.iter().join(", "),
                "pruned subsets without data"
            );
        }

        if children.is_empty() {
            // no subset survived: a required composite gets one more chance
            // as if it were atomic, a non-required one is pruned wholesale
            if required {
                return self.build_atomic(name, true);
            }
            return Ok(None);
        }

        Ok(Some(
            CompositeDatasetGenerator::new(
                self.nesting.clone(),
                name,
                children,
                Arc::clone(graph),
                self.fallback_enabled,
            )
            .into(),
        ))
    }

    fn build_atomic(
        &self,
        name: &str,
        required: bool,
    ) -> ApplicationResult<Option<DatasetGenerator<E>>> {
        let info = DatasetInfo {
            nesting: self.nesting.clone(),
            name: name.to_string(),
            atomic: true,
        };
        match self.factory.create(&info)? {
            Some(source) => Ok(Some(
                AtomicDatasetGenerator::new(self.nesting.clone(), name, source).into(),
            )),
            None if required => Err(DomainError::NoGenerator {
                nesting: self.nesting.clone(),
                dataset: name.to_string(),
            }
            .into()),
            None => Ok(None),
        }
    }
}
