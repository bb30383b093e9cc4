//! Weighted dataset generator tree: atomic leaves wrapping externally
//! supplied value generators, composites performing per-level random descent
//! and fallback search.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rand::RngCore;
use termtree::Tree;
use tracing::warn;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::graph::DatasetGraph;
use crate::domain::selector::WeightedSelector;

/// Weight assumed for leaf generators that do not report one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Records which nesting/dataset actually produced a value. generate() makes
/// a random choice and generate_for_dataset() may silently fall back, so the
/// requested name and the producing name can differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub nesting: String,
    pub dataset: String,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.nesting, self.dataset)
    }
}

/// A produced value together with its provenance tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated<E> {
    pub value: E,
    pub origin: Provenance,
}

/// Externally supplied concrete generator backing one atomic dataset.
///
/// Thread-safety of the generation path is exactly whatever the implementor
/// guarantees behind `&self`; this subsystem forwards the `Send + Sync`
/// requirement but adds nothing on top.
pub trait ValueGenerator<E>: Send + Sync {
    /// Self-reported weight, if the generator carries one.
    fn weight(&self) -> Option<f64> {
        None
    }

    /// Produce one value. Failures propagate to the caller unchanged.
    fn generate(&self, rng: &mut dyn RngCore) -> DomainResult<E>;

    /// Release any held resources. Called once when the owning tree closes.
    fn close(&self) {}
}

/// A node in the generator tree. Exactly two variants exist; dispatch is by
/// pattern match, not open inheritance.
pub enum DatasetGenerator<E> {
    Atomic(AtomicDatasetGenerator<E>),
    Composite(CompositeDatasetGenerator<E>),
}

impl<E> DatasetGenerator<E> {
    pub fn nesting(&self) -> &str {
        match self {
            Self::Atomic(a) => a.nesting(),
            Self::Composite(c) => c.nesting(),
        }
    }

    pub fn dataset(&self) -> &str {
        match self {
            Self::Atomic(a) => a.dataset(),
            Self::Composite(c) => c.dataset(),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Self::Atomic(a) => a.weight(),
            Self::Composite(c) => c.weight(),
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Self::Atomic(_))
    }

    /// Random value from anywhere under this node, weighted per level.
    pub fn generate(&self, rng: &mut dyn RngCore) -> DomainResult<Generated<E>> {
        match self {
            Self::Atomic(a) => a.generate(rng),
            Self::Composite(c) => c.generate(rng),
        }
    }

    /// Value specifically for `requested`, falling back where configured.
    pub fn generate_for_dataset(
        &self,
        requested: &str,
        rng: &mut dyn RngCore,
    ) -> DomainResult<Generated<E>> {
        match self {
            Self::Atomic(a) => a.generate_for_dataset(requested, rng),
            Self::Composite(c) => c.generate_for_dataset(requested, rng),
        }
    }

    pub fn close(&self) {
        match self {
            Self::Atomic(a) => a.close(),
            Self::Composite(c) => c.close(),
        }
    }

    /// Render this subtree with per-node weights for diagnostics.
    pub fn to_tree_string(&self) -> Tree<String> {
        match self {
            Self::Atomic(a) => Tree::new(format!("{} ({})", a.dataset(), a.weight())),
            Self::Composite(c) => {
                Tree::new(format!("{} ({})", c.dataset(), c.weight()))
                    .with_leaves(c.children().items().map(|child| child.to_tree_string()))
            }
        }
    }
}

impl<E> fmt::Debug for DatasetGenerator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic(a) => a.fmt(f),
            Self::Composite(c) => c.fmt(f),
        }
    }
}

impl<E> From<AtomicDatasetGenerator<E>> for DatasetGenerator<E> {
    fn from(value: AtomicDatasetGenerator<E>) -> Self {
        Self::Atomic(value)
    }
}

impl<E> From<CompositeDatasetGenerator<E>> for DatasetGenerator<E> {
    fn from(value: CompositeDatasetGenerator<E>) -> Self {
        Self::Composite(value)
    }
}

/// Leaf node: wraps one externally supplied generator and tags its output
/// with this node's own identity.
pub struct AtomicDatasetGenerator<E> {
    nesting: String,
    dataset: String,
    weight: f64,
    source: Box<dyn ValueGenerator<E>>,
}

impl<E> AtomicDatasetGenerator<E> {
    /// Weight is taken from the wrapped generator, defaulting to
    /// [`DEFAULT_WEIGHT`] when it reports none.
    pub fn new(
        nesting: impl Into<String>,
        dataset: impl Into<String>,
        source: Box<dyn ValueGenerator<E>>,
    ) -> Self {
        let weight = source.weight().unwrap_or(DEFAULT_WEIGHT);
        Self::with_weight(nesting, dataset, source, weight)
    }

    pub fn with_weight(
        nesting: impl Into<String>,
        dataset: impl Into<String>,
        source: Box<dyn ValueGenerator<E>>,
        weight: f64,
    ) -> Self {
        Self {
            nesting: nesting.into(),
            dataset: dataset.into(),
            weight,
            source,
        }
    }

    pub fn nesting(&self) -> &str {
        &self.nesting
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> DomainResult<Generated<E>> {
        let value = self.source.generate(rng)?;
        Ok(Generated {
            value,
            origin: Provenance {
                nesting: self.nesting.clone(),
                dataset: self.dataset.clone(),
            },
        })
    }

    /// An atomic node can only ever answer for itself.
    pub fn generate_for_dataset(
        &self,
        requested: &str,
        rng: &mut dyn RngCore,
    ) -> DomainResult<Generated<E>> {
        if requested != self.dataset {
            return Err(DomainError::RequestMismatch {
                requested: requested.to_string(),
                own: self.dataset.clone(),
            });
        }
        self.generate(rng)
    }

    pub fn close(&self) {
        self.source.close();
    }
}

impl<E> fmt::Debug for AtomicDatasetGenerator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicDatasetGenerator")
            .field("nesting", &self.nesting)
            .field("dataset", &self.dataset)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Internal node: owns a weighted selector over its immediate children and
/// resolves unmatched requests through the taxonomy graph.
///
/// The memoized fallback target is keyed by this node, not by the missed
/// name: a second, different unknown name reuses the first resolved target.
/// That is observable reference behavior, kept deliberately.
pub struct CompositeDatasetGenerator<E> {
    nesting: String,
    dataset: String,
    children: WeightedSelector<DatasetGenerator<E>>,
    graph: Arc<DatasetGraph>,
    fallback_enabled: bool,
    fallback: Mutex<Option<String>>,
}

impl<E> CompositeDatasetGenerator<E> {
    pub fn new(
        nesting: impl Into<String>,
        dataset: impl Into<String>,
        children: WeightedSelector<DatasetGenerator<E>>,
        graph: Arc<DatasetGraph>,
        fallback_enabled: bool,
    ) -> Self {
        Self {
            nesting: nesting.into(),
            dataset: dataset.into(),
            children,
            graph,
            fallback_enabled,
            fallback: Mutex::new(None),
        }
    }

    pub fn nesting(&self) -> &str {
        &self.nesting
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Total weight of this node's own selector.
    pub fn weight(&self) -> f64 {
        self.children.total_weight()
    }

    pub fn children(&self) -> &WeightedSelector<DatasetGenerator<E>> {
        &self.children
    }

    /// Draw one immediate child; a composite child re-draws at its own
    /// level. The probability of reaching a leaf is the product of
    /// weight/level-total along the path, not flat weight over the sum of
    /// all leaf weights.
    pub fn generate(&self, rng: &mut dyn RngCore) -> DomainResult<Generated<E>> {
        let child = self.children.pick(&mut *rng).ok_or_else(|| DomainError::EmptySelection {
            nesting: self.nesting.clone(),
            dataset: self.dataset.clone(),
        })?;
        child.generate(rng)
    }

    pub fn generate_for_dataset(
        &self,
        requested: &str,
        rng: &mut dyn RngCore,
    ) -> DomainResult<Generated<E>> {
        if requested == self.dataset {
            return self.generate(rng);
        }
        if let Some(node) = self.find(requested) {
            return node.generate(rng);
        }
        if !self.fallback_enabled {
            return Err(DomainError::MissingDataset {
                nesting: self.nesting.clone(),
                dataset: requested.to_string(),
            });
        }
        let target = self.fallback_target(requested)?;
        warn!(
            nesting = %self.nesting,
            requested,
            fallback = %target,
            "requested dataset has no generator, substituting fallback"
        );
        match self.find(&target) {
            Some(node) => node.generate(rng),
            None => Err(DomainError::InconsistentTaxonomy {
                nesting: self.nesting.clone(),
                dataset: requested.to_string(),
            }),
        }
    }

    /// Exact-name search over this subtree, declaration order, never random.
    pub fn find(&self, name: &str) -> Option<&DatasetGenerator<E>> {
        for child in self.children.items() {
            if child.dataset() == name {
                return Some(child);
            }
            if let DatasetGenerator::Composite(composite) = child {
                if let Some(hit) = composite.find(name) {
                    return Some(hit);
                }
            }
        }
        None
    }

    /// Dataset name of the first atomic leaf in pre-order under this node.
    pub fn first_atomic_name(&self) -> Option<String> {
        for child in self.children.items() {
            match child {
                DatasetGenerator::Atomic(a) => return Some(a.dataset().to_string()),
                DatasetGenerator::Composite(c) => {
                    if let Some(name) = c.first_atomic_name() {
                        return Some(name);
                    }
                }
            }
        }
        None
    }

    pub fn close(&self) {
        for child in self.children.items() {
            child.close();
        }
    }

    /// One fallback target for the whole node, resolved on the first miss
    /// and reused afterwards. Population happens at most once; concurrent
    /// first misses serialize on the slot mutex.
    fn fallback_target(&self, requested: &str) -> DomainResult<String> {
        let mut slot = self.fallback.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(target) = slot.as_ref() {
            return Ok(target.clone());
        }
        let resolved = self.resolve_fallback(requested)?;
        *slot = Some(resolved.clone());
        Ok(resolved)
    }

    /// Fallback search:
    /// 1. an unrecognized name (unknown to the taxonomy, or outside this
    ///    node's subtree) falls back to the first atomic leaf of this
    ///    generator tree in pre-order;
    /// 2. a recognized descendant walks its taxonomy parents and takes the
    ///    first sibling subtree this node can already resolve, preferring a
    ///    directly atomic sibling over a composite sibling's first atomic
    ///    descendant;
    /// 3. nothing resolving means the taxonomy and the available generators
    ///    are inconsistent.
    fn resolve_fallback(&self, requested: &str) -> DomainResult<String> {
        let inconsistent = || DomainError::InconsistentTaxonomy {
            nesting: self.nesting.clone(),
            dataset: requested.to_string(),
        };

        let Some((own, req)) = self.graph.get(&self.dataset).zip(self.graph.get(requested))
        else {
            return self.first_atomic_name().ok_or_else(inconsistent);
        };
        if !self.graph.is_descendant(own, req) {
            return self.first_atomic_name().ok_or_else(inconsistent);
        }

        let parents = self
            .graph
            .node(req)
            .map(|n| n.parents.clone())
            .unwrap_or_default();
        for parent in parents {
            let Some(parent_node) = self.graph.node(parent) else {
                continue;
            };
            let siblings: Vec<_> = parent_node
                .subsets
                .iter()
                .copied()
                .filter(|&s| s != req)
                .collect();

            for &sibling in &siblings {
                if let Some(node) = self.graph.node(sibling) {
                    if node.is_atomic() && self.find(&node.name).is_some() {
                        return Ok(node.name.clone());
                    }
                }
            }
            for &sibling in &siblings {
                let Some(node) = self.graph.node(sibling) else {
                    continue;
                };
                if node.is_atomic() {
                    continue;
                }
                for leaf in self.graph.atomic_descendants(sibling) {
                    if let Some(leaf_node) = self.graph.node(leaf) {
                        if self.find(&leaf_node.name).is_some() {
                            return Ok(leaf_node.name.clone());
                        }
                    }
                }
            }
        }
        Err(inconsistent())
    }
}

impl<E> fmt::Debug for CompositeDatasetGenerator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDatasetGenerator")
            .field("nesting", &self.nesting)
            .field("dataset", &self.dataset)
            .field("children", &self.children.len())
            .field("weight", &self.weight())
            .finish()
    }
}
