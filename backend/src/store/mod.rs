//! Local implementations of the engine ports.
//!
//! Templates, working copies, setups, properties and the mail outbox live in
//! one SQLite file. Data sources are CSV files and output folders are plain
//! directories.

pub mod configs;
pub mod csv_source;
pub mod documents;
pub mod folders;
pub mod outbox;
pub mod properties;
pub mod templates;

pub use configs::SqliteConfigRepository;
pub use csv_source::{CsvDataSource, CsvDataSources};
pub use documents::SqliteDocumentStore;
pub use folders::LocalFolderStorage;
pub use outbox::{OutboxEntry, SqliteOutbox};
pub use properties::SqliteKeyValueStore;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    text TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS images (
    id TEXT NOT NULL,
    template_id TEXT NOT NULL,
    base64 TEXT NOT NULL,
    PRIMARY KEY (id, template_id)
);
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    template_id TEXT NOT NULL,
    container_id TEXT NOT NULL,
    text TEXT NOT NULL,
    trashed INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS job_configs (
    name TEXT PRIMARY KEY,
    data_source_id TEXT NOT NULL,
    template_ref TEXT NOT NULL,
    output_ref TEXT NOT NULL,
    file_name_field TEXT NOT NULL DEFAULT '',
    email_field TEXT NOT NULL DEFAULT '',
    subject_template TEXT NOT NULL DEFAULT '',
    body_template TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS properties (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS outbox (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient TEXT NOT NULL,
    subject TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS outbox_attachments (
    message_id INTEGER NOT NULL REFERENCES outbox(id),
    name TEXT NOT NULL,
    content_type TEXT NOT NULL,
    bytes BLOB NOT NULL
);
";

/// Open (creating if needed) the database at `path` with the schema applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// In-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}
