//! Collaborator interfaces the merge runner depends on.
//!
//! Each trait is the smallest surface the pipeline needs from a spreadsheet,
//! document, file or mail backend. The runner owns nothing but what these
//! return; local implementations live in `crate::store`.

use crate::engine::document::Presentation;
use crate::error::Result;
use common::model::cell::CellValue;

/// MIME type requested when exporting a finished document.
pub const PDF_MIME: &str = "application/pdf";

/// A grid-shaped data source. Rows and columns are 1-based; the header is
/// row 1.
pub trait TabularDataSource {
    /// Every row of the table, header first.
    fn get_all_rows(&self) -> Result<Vec<Vec<CellValue>>>;

    /// 1-based index of the last column holding any cell.
    fn last_column(&self) -> Result<usize>;

    /// Insert an empty column directly after `column`.
    fn insert_column_after(&mut self, column: usize) -> Result<()>;

    fn set_cell(&mut self, row: usize, column: usize, value: &str) -> Result<()>;
}

/// Opens data sources by the identifier stored in a job config.
pub trait DataSourceProvider {
    /// `Ok(None)` when no such source exists.
    fn open(&self, data_source_id: &str) -> Result<Option<Box<dyn TabularDataSource>>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub container_id: String,
    pub id: String,
    pub name: String,
}

/// Exported document bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Template and working-copy documents.
pub trait DocumentStore {
    fn get_by_id(&self, id: &str) -> Result<Option<DocumentRef>>;

    /// Copy `source` into `container`, returning the new document.
    fn clone_into(&self, source: &DocumentRef, container: &ContainerRef) -> Result<DocumentRef>;

    /// Load the editable content of a document.
    fn open(&self, document: &DocumentRef) -> Result<Presentation>;

    /// Commit edited content back to the document.
    fn save_and_close(&self, document: &DocumentRef, content: Presentation) -> Result<()>;

    fn export_as(&self, document: &DocumentRef, mime: &str) -> Result<Blob>;

    fn trash(&self, document: &DocumentRef) -> Result<()>;
}

/// A discrete text-bearing part of a document, e.g. one slide.
pub trait ContentSurface {
    fn text(&self) -> &str;

    /// Replace every literal occurrence of `token`, returning the count.
    fn replace_all_occurrences(&mut self, token: &str, replacement: &str) -> usize;
}

/// A document made of content surfaces.
pub trait ContentDocument {
    type Surface: ContentSurface;

    fn content_surfaces_mut(&mut self) -> &mut [Self::Surface];
}

/// Folder-like storage for generated artifacts.
pub trait ArtifactStorage {
    fn get_by_id(&self, id: &str) -> Result<Option<ContainerRef>>;

    /// Store `blob` under `name`. Name collisions are resolved by the backend.
    fn create_file(&self, container: &ContainerRef, blob: &Blob, name: &str) -> Result<FileRef>;

    /// Grant view access to anyone holding the link.
    fn set_public_view_access(&self, file: &FileRef) -> Result<()>;

    fn get_url(&self, file: &FileRef) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Outbound mail.
pub trait Messenger {
    fn send(&self, message: &OutgoingMessage) -> Result<()>;
}
