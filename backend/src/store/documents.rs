//! SQLite-backed template and working-copy documents.
//!
//! Templates are read-only through the `DocumentStore` port; clones land in
//! the `documents` table, remember the template they came from (for images)
//! and are soft-deleted by `trash`.

use crate::engine::document::Presentation;
use crate::engine::ports::{Blob, ContainerRef, DocumentRef, DocumentStore, PDF_MIME};
use crate::error::{Error, Result};
use crate::render::pdf;
use crate::store::templates::load_images;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Where a document's content lives.
enum Origin {
    Template { text: String },
    Copy { template_id: String, text: String },
}

impl Origin {
    fn template_id<'a>(&'a self, id: &'a str) -> &'a str {
        match self {
            Origin::Template { .. } => id,
            Origin::Copy { template_id, .. } => template_id,
        }
    }

    fn text(&self) -> &str {
        match self {
            Origin::Template { text } | Origin::Copy { text, .. } => text,
        }
    }
}

/// Templates and generated documents kept in SQLite, rendered to PDF with
/// the fonts found in `fonts_dir`.
pub struct SqliteDocumentStore {
    conn: Connection,
    fonts_dir: PathBuf,
}

impl SqliteDocumentStore {
    pub fn new(conn: Connection, fonts_dir: impl Into<PathBuf>) -> Self {
        Self {
            conn,
            fonts_dir: fonts_dir.into(),
        }
    }

    fn lookup(&self, id: &str) -> Result<Option<Origin>> {
        let template = self
            .conn
            .query_row(
                "SELECT text FROM templates WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        if let Some(text) = template {
            return Ok(Some(Origin::Template { text }));
        }

        let copy = self
            .conn
            .query_row(
                "SELECT template_id, text FROM documents WHERE id = ?1 AND trashed = 0",
                params![id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(copy.map(|(template_id, text)| Origin::Copy { template_id, text }))
    }

    fn require(&self, document: &DocumentRef) -> Result<Origin> {
        self.lookup(&document.id)?
            .ok_or_else(|| Error::DocumentNotFound(document.id.clone()))
    }

    /// Decoded images of a template keyed by image id. Undecodable entries
    /// are skipped.
    fn images(&self, template_id: &str) -> Result<HashMap<String, Vec<u8>>> {
        let mut images = HashMap::new();
        for image in load_images(&self.conn, template_id)? {
            match BASE64.decode(&image.base64) {
                Ok(bytes) => {
                    images.insert(image.id, bytes);
                }
                Err(e) => warn!("Skipping image {} of template {}: {}", image.id, template_id, e),
            }
        }
        Ok(images)
    }

    /// Render any document (template or copy) to PDF bytes.
    pub fn render_pdf(&self, document: &DocumentRef, title: &str) -> Result<Vec<u8>> {
        let origin = self.require(document)?;
        let images = self.images(origin.template_id(&document.id))?;
        pdf::render_presentation(
            &Presentation::parse(origin.text()),
            &images,
            &self.fonts_dir,
            title,
        )
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get_by_id(&self, id: &str) -> Result<Option<DocumentRef>> {
        Ok(self.lookup(id)?.map(|_| DocumentRef { id: id.to_string() }))
    }

    fn clone_into(&self, source: &DocumentRef, container: &ContainerRef) -> Result<DocumentRef> {
        let origin = self.require(source)?;
        let id = Uuid::new_v4().simple().to_string();
        self.conn.execute(
            "INSERT INTO documents (id, template_id, container_id, text) VALUES (?1, ?2, ?3, ?4)",
            params![&id, origin.template_id(&source.id), &container.id, origin.text()],
        )?;
        Ok(DocumentRef { id })
    }

    fn open(&self, document: &DocumentRef) -> Result<Presentation> {
        Ok(Presentation::parse(self.require(document)?.text()))
    }

    fn save_and_close(&self, document: &DocumentRef, content: Presentation) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE documents SET text = ?1 WHERE id = ?2 AND trashed = 0",
            params![content.to_text(), &document.id],
        )?;
        if updated == 0 {
            return Err(Error::DocumentNotFound(document.id.clone()));
        }
        Ok(())
    }

    fn export_as(&self, document: &DocumentRef, mime: &str) -> Result<Blob> {
        if mime != PDF_MIME {
            return Err(Error::UnsupportedExport(mime.to_string()));
        }
        Ok(Blob {
            content_type: PDF_MIME.to_string(),
            bytes: self.render_pdf(document, "Merged document")?,
        })
    }

    fn trash(&self, document: &DocumentRef) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE documents SET trashed = 1 WHERE id = ?1 AND trashed = 0",
            params![&document.id],
        )?;
        if updated == 0 {
            return Err(Error::DocumentNotFound(document.id.clone()));
        }
        Ok(())
    }
}
