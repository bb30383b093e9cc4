//! I/O boundary traits for testability
//!
//! These traits abstract where hierarchy property text comes from, allowing
//! the registry to be fed from files, embedded data, or test fixtures.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Source of raw hierarchy property text, one payload per nesting.
pub trait HierarchySource: Send + Sync {
    /// Raw property text for `nesting`.
    fn load(&self, nesting: &str) -> io::Result<String>;

    /// Nestings this source can serve.
    fn available(&self) -> io::Result<Vec<String>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// File-backed source: one `<nesting>.properties` file per nesting inside a
/// data directory.
#[derive(Debug, Clone)]
pub struct FileHierarchySource {
    data_dir: PathBuf,
}

impl FileHierarchySource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, nesting: &str) -> PathBuf {
        self.data_dir.join(format!("{nesting}.properties"))
    }
}

impl HierarchySource for FileHierarchySource {
    fn load(&self, nesting: &str) -> io::Result<String> {
        std::fs::read_to_string(self.path_for(nesting))
    }

    fn available(&self) -> io::Result<Vec<String>> {
        let mut nestings = Vec::new();
        for entry in WalkDir::new(&self.data_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_properties = path
                .extension()
                .map(|ext| ext == "properties")
                .unwrap_or(false);
            if !is_properties {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                nestings.push(stem.to_string_lossy().into_owned());
            }
        }
        nestings.sort();
        Ok(nestings)
    }
}

/// In-memory source for embedded taxonomies and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticHierarchySource {
    entries: HashMap<String, String>,
}

impl StaticHierarchySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, nesting: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(nesting.into(), text.into());
        self
    }

    pub fn insert(&mut self, nesting: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(nesting.into(), text.into());
    }
}

impl HierarchySource for StaticHierarchySource {
    fn load(&self, nesting: &str) -> io::Result<String> {
        self.entries.get(nesting).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no hierarchy registered for nesting '{nesting}'"),
            )
        })
    }

    fn available(&self) -> io::Result<Vec<String>> {
        let mut nestings: Vec<String> = self.entries.keys().cloned().collect();
        nestings.sort();
        Ok(nestings)
    }
}
