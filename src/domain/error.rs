//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent taxonomy and generation contract violations.
/// These are independent of how hierarchy sources are loaded.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("no dataset '{dataset}' in nesting '{nesting}' and fallback is disabled")]
    MissingDataset { nesting: String, dataset: String },

    #[error("no generator available for required dataset '{dataset}' in nesting '{nesting}'")]
    NoGenerator { nesting: String, dataset: String },

    #[error("taxonomy of nesting '{nesting}' is inconsistent: no fallback resolves '{dataset}'")]
    InconsistentTaxonomy { nesting: String, dataset: String },

    #[error("atomic dataset '{own}' cannot answer a request for '{requested}'")]
    RequestMismatch { requested: String, own: String },

    #[error("dataset '{dataset}' in nesting '{nesting}' has no selectable children")]
    EmptySelection { nesting: String, dataset: String },

    #[error("cycle detected in nesting '{nesting}' at dataset '{dataset}'")]
    CycleDetected { nesting: String, dataset: String },

    #[error("generator tree has not been initialized")]
    NotInitialized,

    #[error("{0}")]
    Leaf(Box<dyn std::error::Error + Send + Sync>),
}

impl DomainError {
    /// Wrap a leaf generator failure without altering its message.
    pub fn leaf(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Leaf(err.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
