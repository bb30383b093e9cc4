//! Arena-backed dataset taxonomy for one nesting.
//!
//! A nesting (e.g. "region") maps dataset names to nodes. Nodes keep ordered
//! subset links plus parent back-references, so a node referenced by several
//! composites makes the structure a DAG rather than a strict tree.

use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;

/// A node in the dataset taxonomy. Identity is (nesting, name); the owning
/// graph's name map enforces uniqueness.
#[derive(Debug, Clone)]
pub struct DatasetNode {
    /// Dataset name, unique within the nesting
    pub name: String,
    /// Composites referencing this node as a subset (non-owning back-links)
    pub parents: Vec<Index>,
    /// Owned children, in declaration order
    pub subsets: Vec<Index>,
}

impl DatasetNode {
    /// A dataset is atomic iff it has no subsets.
    pub fn is_atomic(&self) -> bool {
        self.subsets.is_empty()
    }
}

impl fmt::Display for DatasetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lightweight dataset descriptor handed across layer boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub nesting: String,
    pub name: String,
    pub atomic: bool,
}

impl DatasetInfo {
    /// Identity string, e.g. `region:dach`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.nesting, self.name)
    }
}

/// Arena-based taxonomy graph for one nesting.
///
/// Uses a generational arena for node storage and a name map for O(1)
/// lookups. Immutable once parsing has finished.
#[derive(Debug)]
pub struct DatasetGraph {
    nesting: String,
    arena: Arena<DatasetNode>,
    by_name: HashMap<String, Index>,
}

impl DatasetGraph {
    pub fn new(nesting: impl Into<String>) -> Self {
        Self {
            nesting: nesting.into(),
            arena: Arena::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn nesting(&self) -> &str {
        &self.nesting
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Look up a dataset by name, or insert a fresh atomic node for it.
    #[instrument(level = "trace", skip(self))]
    pub fn get_or_create(&mut self, name: &str) -> Index {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }
        let idx = self.arena.insert(DatasetNode {
            name: name.to_string(),
            parents: Vec::new(),
            subsets: Vec::new(),
        });
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    /// Link `child` as the next subset of `parent` and register the inverse
    /// parent link in the same operation. Duplicate and self links are
    /// ignored.
    #[instrument(level = "trace", skip(self))]
    pub fn add_subset(&mut self, parent: Index, child: Index) {
        if parent == child {
            return;
        }
        if let Some(node) = self.arena.get_mut(parent) {
            if node.subsets.contains(&child) {
                return;
            }
            node.subsets.push(child);
        }
        if let Some(node) = self.arena.get_mut(child) {
            if !node.parents.contains(&parent) {
                node.parents.push(parent);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Index> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn node(&self, idx: Index) -> Option<&DatasetNode> {
        self.arena.get(idx)
    }

    pub fn name_of(&self, idx: Index) -> Option<&str> {
        self.arena.get(idx).map(|n| n.name.as_str())
    }

    /// Subset names of `idx` in declaration order.
    pub fn subset_names(&self, idx: Index) -> Vec<String> {
        self.arena
            .get(idx)
            .map(|n| {
                n.subsets
                    .iter()
                    .filter_map(|&s| self.name_of(s))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Descriptor for a known dataset; `None` for unknown names.
    pub fn info(&self, name: &str) -> Option<DatasetInfo> {
        self.get(name).and_then(|i| self.arena.get(i)).map(|n| DatasetInfo {
            nesting: self.nesting.clone(),
            name: n.name.clone(),
            atomic: n.is_atomic(),
        })
    }

    /// True if `target` is reachable from `root` via subset links, the root
    /// itself included.
    #[instrument(level = "trace", skip(self))]
    pub fn is_descendant(&self, root: Index, target: Index) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.arena.get(current) {
                stack.extend(node.subsets.iter().copied());
            }
        }
        false
    }

    /// All atomic descendants of `root` in pre-order (first declared branch
    /// first). Nodes shared between branches appear once.
    #[instrument(level = "debug", skip(self))]
    pub fn atomic_descendants(&self, root: Index) -> Vec<Index> {
        let mut leaves = Vec::new();
        let mut visited = HashSet::new();
        self.collect_atomic(root, &mut visited, &mut leaves);
        leaves
    }

    fn collect_atomic(&self, idx: Index, visited: &mut HashSet<Index>, leaves: &mut Vec<Index>) {
        if !visited.insert(idx) {
            return;
        }
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        if node.is_atomic() {
            leaves.push(idx);
            return;
        }
        for &child in &node.subsets {
            self.collect_atomic(child, visited, leaves);
        }
    }

    /// Name of some dataset on a cycle, or `None` if the graph is acyclic.
    /// Run after parsing; traversals assume acyclicity.
    pub fn find_cycle(&self) -> Option<&str> {
        let mut done: HashSet<Index> = HashSet::new();
        for (idx, _) in self.arena.iter() {
            let mut in_progress = HashSet::new();
            if let Some(hit) = self.visit_cycle(idx, &mut in_progress, &mut done) {
                return self.name_of(hit);
            }
        }
        None
    }

    fn visit_cycle(
        &self,
        idx: Index,
        in_progress: &mut HashSet<Index>,
        done: &mut HashSet<Index>,
    ) -> Option<Index> {
        if done.contains(&idx) {
            return None;
        }
        if !in_progress.insert(idx) {
            return Some(idx);
        }
        if let Some(node) = self.arena.get(idx) {
            for &child in &node.subsets {
                if let Some(hit) = self.visit_cycle(child, in_progress, done) {
                    return Some(hit);
                }
            }
        }
        in_progress.remove(&idx);
        done.insert(idx);
        None
    }

    /// Render the subtree under `root` for diagnostics.
    pub fn to_tree_string(&self, root: Index) -> Tree<String> {
        let label = self
            .name_of(root)
            .map(String::from)
            .unwrap_or_else(|| "<removed>".to_string());
        let leaves: Vec<_> = self
            .arena
            .get(root)
            .map(|n| n.subsets.iter().map(|&s| self.to_tree_string(s)).collect())
            .unwrap_or_default();
        Tree::new(label).with_leaves(leaves)
    }
}
