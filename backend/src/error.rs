//! Error types for the merge engine and its local collaborators.

use thiserror::Error;

/// Errors raised while configuring or running a merge.
///
/// Every variant is fatal to the job it occurs in: the runner never retries
/// and never skips a failing row.
#[derive(Error, Debug)]
pub enum Error {
    /// No runnable setups exist.
    #[error("no merge setups are configured")]
    ConfigurationMissing,

    #[error("merge setup not found: {0}")]
    ConfigNotFound(String),

    /// A template or folder reference does not contain an identifier.
    #[error("could not resolve {kind} reference: {reference:?}")]
    ReferenceResolution {
        kind: &'static str,
        reference: String,
    },

    #[error("data source not found: {0}")]
    DataSourceNotFound(String),

    #[error("data source {0} has no header row")]
    EmptyDataSource(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("output folder not found: {0}")]
    ContainerNotFound(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The row has no value in the configured email column.
    #[error("row {row}: no recipient in column {field:?}")]
    MissingRecipient { row: usize, field: String },

    #[error("unsupported export format: {0}")]
    UnsupportedExport(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    /// Failure reported by an external collaborator.
    #[error("{0}")]
    Backend(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for slidemerge operations
pub type Result<T> = std::result::Result<T, Error>;
