//! Hierarchy registry service
//!
//! Loads and caches, per nesting, the dataset taxonomy parsed from an
//! external property source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use regex::Regex;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{DatasetGraph, DatasetInfo, DomainError};
use crate::infrastructure::traits::{FileHierarchySource, HierarchySource};

/// Parse-once cache of dataset taxonomies.
///
/// The property payload maps a composite dataset name to a comma-separated
/// list of its immediate subsets:
///
/// ```text
/// # continents
/// world = europe, asia
/// europe = DE, AT, CH
/// ```
///
/// Names appearing only as values become implicit atomic leaves.
pub struct HierarchyRegistry {
    source: Arc<dyn HierarchySource>,
    line_regex: Regex,
    graphs: Mutex<HashMap<String, Arc<DatasetGraph>>>,
}

impl HierarchyRegistry {
    pub fn new(source: Arc<dyn HierarchySource>) -> Self {
        Self {
            source,
            line_regex: Regex::new(r"^\s*([^#!=\s][^=]*?)\s*=\s*(.*)$").unwrap(),
            graphs: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over `<data_dir>/<nesting>.properties` files.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Arc::new(FileHierarchySource::new(&settings.data_dir)))
    }

    /// The taxonomy for `nesting`, parsing it on first access. The cache
    /// lock is held across parsing, so concurrent first callers cannot
    /// duplicate the work.
    pub fn graph(&self, nesting: &str) -> ApplicationResult<Arc<DatasetGraph>> {
        let mut graphs = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(graph) = graphs.get(nesting) {
            return Ok(Arc::clone(graph));
        }
        let text = self
            .source
            .load(nesting)
            .map_err(|e| ApplicationError::SourceUnavailable {
                nesting: nesting.to_string(),
                source: e,
            })?;
        let graph = Arc::new(self.parse(nesting, &text)?);
        graphs.insert(nesting.to_string(), Arc::clone(&graph));
        Ok(graph)
    }

    /// Descriptor for a dataset. Unknown names resolve to a fresh atomic
    /// descriptor rather than erroring; the parsed taxonomy itself stays
    /// untouched.
    pub fn dataset(&self, nesting: &str, name: &str) -> ApplicationResult<DatasetInfo> {
        let graph = self.graph(nesting)?;
        Ok(graph.info(name).unwrap_or_else(|| DatasetInfo {
            nesting: nesting.to_string(),
            name: name.to_string(),
            atomic: true,
        }))
    }

    /// Atomic descendants of `name` in pre-order. An unknown name is its own
    /// sole atomic descendant.
    pub fn atomic_descendants(&self, nesting: &str, name: &str) -> ApplicationResult<Vec<String>> {
        let graph = self.graph(nesting)?;
        let Some(idx) = graph.get(name) else {
            return Ok(vec![name.to_string()]);
        };
        Ok(graph
            .atomic_descendants(idx)
            .into_iter()
            .filter_map(|i| graph.name_of(i))
            .map(String::from)
            .collect())
    }

    /// Nestings the underlying source can serve.
    pub fn available_nestings(&self) -> ApplicationResult<Vec<String>> {
        self.source
            .available()
            .map_err(|e| ApplicationError::OperationFailed {
                context: "list available nestings".to_string(),
                source: Box::new(e),
            })
    }

    fn parse(&self, nesting: &str, text: &str) -> ApplicationResult<DatasetGraph> {
        debug!(nesting, "parsing hierarchy");
        let mut graph = DatasetGraph::new(nesting);
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            let Some(caps) = self.line_regex.captures(line) else {
                debug!(nesting, line, "skipping line without key=value shape");
                continue;
            };
            let key = caps.get(1).unwrap().as_str();
            let parent = graph.get_or_create(key);
            for token in caps.get(2).unwrap().as_str().split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                let child = graph.get_or_create(token);
                graph.add_subset(parent, child);
            }
        }
        if let Some(name) = graph.find_cycle() {
            return Err(DomainError::CycleDetected {
                nesting: nesting.to_string(),
                dataset: name.to_string(),
            }
            .into());
        }
        debug!(nesting, datasets = graph.len(), "hierarchy parsed");
        Ok(graph)
    }
}
