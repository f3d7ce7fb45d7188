//! The merge-and-dispatch engine.
//!
//! Pure pieces (`token`, `rows`, `reference`, `report`) have no I/O. The
//! `runner` drives them against the collaborator traits in `ports`; which
//! backends sit behind those traits is decided by the caller.

pub mod config_store;
pub mod document;
pub mod ports;
pub mod reference;
pub mod report;
pub mod rows;
pub mod runner;
pub mod token;

pub use config_store::{
    select_job, ConfigRepository, InMemoryConfigRepository, JobSelector, KeyValueStore,
    MemoryProperties, PropertyConfigRepository,
};
pub use document::{Presentation, Slide};
pub use ports::{
    ArtifactStorage, Attachment, Blob, ContainerRef, ContentDocument, ContentSurface,
    DataSourceProvider, DocumentRef, DocumentStore, FileRef, Messenger, OutgoingMessage,
    TabularDataSource, PDF_MIME,
};
pub use reference::extract_id;
pub use report::summarize;
pub use rows::{extract_rows, extract_rows_within};
pub use runner::{MergeRunner, MergeUpdate, RESULT_COLUMN_TITLE};
pub use token::{apply_template, substitute, substitute_in_document, token, tokenize, Segment};
