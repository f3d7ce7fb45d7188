//! Recording collaborators for merge runner tests.
//!
//! Every stub writes to a shared [`Journal`] so tests can check the order of
//! side effects across collaborators, and most can be told to fail.

#![allow(dead_code)]

use common::model::cell::CellValue;
use slidemerge::engine::{
    ArtifactStorage, Blob, ContainerRef, DataSourceProvider, DocumentRef, DocumentStore, FileRef,
    Messenger, OutgoingMessage, Presentation, TabularDataSource,
};
use slidemerge::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEMPLATE_ID: &str = "tmpl-certificate-0123456789abcdef";
pub const FOLDER_ID: &str = "folder-outbound-0123456789abcdef";

/// A side effect observed by one of the stubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    InsertColumn { after: usize },
    SetCell { row: usize, column: usize, value: String },
    Clone { copy: String },
    Save { copy: String },
    Export { copy: String },
    Trash { copy: String },
    CreateFile { name: String },
    Share { name: String },
    Send { to: String },
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn record(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }

    pub fn cell_writes(&self) -> Vec<(usize, usize, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::SetCell { row, column, value } => Some((row, column, value)),
                _ => None,
            })
            .collect()
    }
}

// === Data source ===

/// Grid of strings shared with the test, so writes stay visible after the
/// runner drops its handle.
#[derive(Debug, Clone)]
pub struct StubSource {
    rows: Arc<Mutex<Vec<Vec<String>>>>,
    journal: Journal,
}

impl StubSource {
    pub fn new(journal: &Journal, rows: &[&[&str]]) -> Self {
        Self {
            rows: Arc::new(Mutex::new(
                rows.iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect(),
            )),
            journal: journal.clone(),
        }
    }

    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.rows.lock().unwrap().clone()
    }

    pub fn cell(&self, row: usize, column: usize) -> String {
        self.rows
            .lock()
            .unwrap()
            .get(row - 1)
            .and_then(|r| r.get(column - 1))
            .cloned()
            .unwrap_or_default()
    }
}

impl TabularDataSource for StubSource {
    fn get_all_rows(&self) -> Result<Vec<Vec<CellValue>>> {
        let width = self.last_column()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|i| CellValue::from(row.get(i).map(String::as_str).unwrap_or("")))
                    .collect()
            })
            .collect())
    }

    fn last_column(&self) -> Result<usize> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter_map(|row| row.iter().rposition(|c| !c.is_empty()).map(|i| i + 1))
            .max()
            .unwrap_or(0))
    }

    fn insert_column_after(&mut self, column: usize) -> Result<()> {
        self.journal.record(Event::InsertColumn { after: column });
        for row in self.rows.lock().unwrap().iter_mut() {
            if row.len() > column {
                row.insert(column, String::new());
            }
        }
        Ok(())
    }

    fn set_cell(&mut self, row: usize, column: usize, value: &str) -> Result<()> {
        self.journal.record(Event::SetCell {
            row,
            column,
            value: value.to_string(),
        });
        let mut rows = self.rows.lock().unwrap();
        if rows.len() < row {
            rows.resize(row, Vec::new());
        }
        let cells = &mut rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct StubProvider {
    sources: HashMap<String, StubSource>,
}

impl StubProvider {
    pub fn with(id: &str, source: &StubSource) -> Self {
        Self {
            sources: HashMap::from([(id.to_string(), source.clone())]),
        }
    }
}

impl DataSourceProvider for StubProvider {
    fn open(&self, data_source_id: &str) -> Result<Option<Box<dyn TabularDataSource>>> {
        Ok(self
            .sources
            .get(data_source_id)
            .map(|s| Box::new(s.clone()) as Box<dyn TabularDataSource>))
    }
}

// === Documents ===

/// One template plus its working copies. Export yields the saved text, so
/// attachments can be checked for substituted content.
pub struct StubDocuments {
    template_text: String,
    copies: Mutex<HashMap<String, String>>,
    next_copy: AtomicUsize,
    journal: Journal,
    error_on_export: Mutex<Option<String>>,
}

impl StubDocuments {
    pub fn new(journal: &Journal, template_text: &str) -> Self {
        Self {
            template_text: template_text.to_string(),
            copies: Mutex::new(HashMap::new()),
            next_copy: AtomicUsize::new(1),
            journal: journal.clone(),
            error_on_export: Mutex::new(None),
        }
    }

    /// Make `export_as` return an error
    pub fn fail_export(&self, msg: &str) {
        *self.error_on_export.lock().unwrap() = Some(msg.to_string());
    }

    /// Copies that were cloned but never trashed.
    pub fn live_copies(&self) -> usize {
        self.copies.lock().unwrap().len()
    }

    fn text(&self, id: &str) -> Result<String> {
        if id == TEMPLATE_ID {
            return Ok(self.template_text.clone());
        }
        self.copies
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
    }
}

impl DocumentStore for StubDocuments {
    fn get_by_id(&self, id: &str) -> Result<Option<DocumentRef>> {
        Ok((self.text(id).is_ok()).then(|| DocumentRef { id: id.to_string() }))
    }

    fn clone_into(&self, source: &DocumentRef, _container: &ContainerRef) -> Result<DocumentRef> {
        let text = self.text(&source.id)?;
        let id = format!("copy-{}", self.next_copy.fetch_add(1, Ordering::SeqCst));
        self.copies.lock().unwrap().insert(id.clone(), text);
        self.journal.record(Event::Clone { copy: id.clone() });
        Ok(DocumentRef { id })
    }

    fn open(&self, document: &DocumentRef) -> Result<Presentation> {
        Ok(Presentation::parse(&self.text(&document.id)?))
    }

    fn save_and_close(&self, document: &DocumentRef, content: Presentation) -> Result<()> {
        let mut copies = self.copies.lock().unwrap();
        let slot = copies
            .get_mut(&document.id)
            .ok_or_else(|| Error::DocumentNotFound(document.id.clone()))?;
        *slot = content.to_text();
        self.journal.record(Event::Save {
            copy: document.id.clone(),
        });
        Ok(())
    }

    fn export_as(&self, document: &DocumentRef, mime: &str) -> Result<Blob> {
        if let Some(msg) = self.error_on_export.lock().unwrap().as_ref() {
            return Err(Error::Backend(msg.clone()));
        }
        self.journal.record(Event::Export {
            copy: document.id.clone(),
        });
        Ok(Blob {
            content_type: mime.to_string(),
            bytes: self.text(&document.id)?.into_bytes(),
        })
    }

    fn trash(&self, document: &DocumentRef) -> Result<()> {
        self.copies
            .lock()
            .unwrap()
            .remove(&document.id)
            .ok_or_else(|| Error::DocumentNotFound(document.id.clone()))?;
        self.journal.record(Event::Trash {
            copy: document.id.clone(),
        });
        Ok(())
    }
}

// === Storage ===

pub struct StubStorage {
    files: Mutex<Vec<(String, Vec<u8>)>>,
    shared: Mutex<Vec<String>>,
    journal: Journal,
}

impl StubStorage {
    pub fn new(journal: &Journal) -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            shared: Mutex::new(Vec::new()),
            journal: journal.clone(),
        }
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn shared(&self) -> Vec<String> {
        self.shared.lock().unwrap().clone()
    }
}

impl ArtifactStorage for StubStorage {
    fn get_by_id(&self, id: &str) -> Result<Option<ContainerRef>> {
        Ok((id == FOLDER_ID).then(|| ContainerRef { id: id.to_string() }))
    }

    fn create_file(&self, container: &ContainerRef, blob: &Blob, name: &str) -> Result<FileRef> {
        self.files
            .lock()
            .unwrap()
            .push((name.to_string(), blob.bytes.clone()));
        self.journal.record(Event::CreateFile {
            name: name.to_string(),
        });
        Ok(FileRef {
            container_id: container.id.clone(),
            id: format!("{}/{}", container.id, name),
            name: name.to_string(),
        })
    }

    fn set_public_view_access(&self, file: &FileRef) -> Result<()> {
        self.shared.lock().unwrap().push(file.name.clone());
        self.journal.record(Event::Share {
            name: file.name.clone(),
        });
        Ok(())
    }

    fn get_url(&self, file: &FileRef) -> Result<String> {
        Ok(format!("https://files.test/{}", file.id))
    }
}

// === Messenger ===

pub struct StubMessenger {
    sent: Mutex<Vec<OutgoingMessage>>,
    /// 1-based send attempt that fails.
    fail_on_send: Mutex<Option<usize>>,
    attempts: AtomicUsize,
    journal: Journal,
}

impl StubMessenger {
    pub fn new(journal: &Journal) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_on_send: Mutex::new(None),
            attempts: AtomicUsize::new(0),
            journal: journal.clone(),
        }
    }

    /// Make the `attempt`-th call to `send` fail
    pub fn fail_send_number(&self, attempt: usize) {
        *self.fail_on_send.lock().unwrap() = Some(attempt);
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Messenger for StubMessenger {
    fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on_send.lock().unwrap() == Some(attempt) {
            return Err(Error::Backend(format!("mail relay refused {}", message.to)));
        }
        self.sent.lock().unwrap().push(message.clone());
        self.journal.record(Event::Send {
            to: message.to.clone(),
        });
        Ok(())
    }
}
