//! Shared types for catalog collaborators.

use thiserror::Error;

/// Errors reported by catalog and history stores.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),
}
