//! CSV files as tabular data sources.
//!
//! A data source id maps to `<dir>/<id>.csv`. The file is read once when
//! opened and edited in place one change at a time, so other readers see
//! result URLs appear row by row.

use crate::engine::ports::{DataSourceProvider, TabularDataSource};
use crate::error::{Error, Result};
use common::model::cell::CellValue;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tempfile::NamedTempFile;

/// Pick the most frequent of `, ; \t |` in the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .max_by_key(|&d| header_line.matches(d as char).count())
        .filter(|&d| header_line.contains(d as char))
        .unwrap_or(b',')
}

/// Data sources stored as CSV files in one directory.
#[derive(Debug, Clone)]
pub struct CsvDataSources {
    dir: PathBuf,
}

impl CsvDataSources {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `id`, or `None` for ids that could escape the directory.
    pub fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '));
        valid.then(|| self.dir.join(format!("{}.csv", id)))
    }
}

impl DataSourceProvider for CsvDataSources {
    fn open(&self, data_source_id: &str) -> Result<Option<Box<dyn TabularDataSource>>> {
        match self.path_for(data_source_id) {
            Some(path) if path.is_file() => Ok(Some(Box::new(CsvDataSource::load(path)?))),
            _ => Ok(None),
        }
    }
}

type FileLocks = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

/// Writer lock for one CSV file, shared by every handle in the process.
fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<FileLocks> = OnceLock::new();
    // Key on the canonical directory so the file need not exist yet.
    let key = match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => dir
            .canonicalize()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    };
    let mut locks = LOCKS
        .get_or_init(FileLocks::default)
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    Arc::clone(locks.entry(key).or_default())
}

/// Run `f` while holding the writer lock of the CSV file at `path`.
///
/// Anything that replaces or edits a data source file goes through here:
/// merge runs writing result cells and uploads replacing the file.
pub fn with_file_lock<T>(path: &Path, f: impl FnOnce() -> T) -> T {
    let lock = file_lock(path);
    let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
    f()
}

fn read_file(path: &Path) -> Result<(u8, Vec<Vec<String>>)> {
    let mut header_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header_line)?;
    let delimiter = detect_delimiter(header_line.trim_end_matches(['\n', '\r']));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;
    Ok((delimiter, rows))
}

fn write_file(path: &Path, delimiter: u8, rows: &[Vec<String>]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .delimiter(delimiter)
            .from_writer(tmp.as_file());
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// One CSV file.
///
/// Reads come from the snapshot taken by `load`. Every mutation re-reads the
/// file under its writer lock, applies the single change and writes it back,
/// so concurrent runs and uploads on the same file never undo each other.
#[derive(Debug)]
pub struct CsvDataSource {
    path: PathBuf,
    rows: Vec<Vec<String>>,
}

impl CsvDataSource {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (_, rows) = with_file_lock(&path, || read_file(&path))?;
        debug!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(Self { path, rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&mut self, edit: impl FnOnce(&mut Vec<Vec<String>>)) -> Result<()> {
        let path = self.path.clone();
        self.rows = with_file_lock(&path, || -> Result<Vec<Vec<String>>> {
            let (delimiter, mut rows) = read_file(&path)?;
            edit(&mut rows);
            write_file(&path, delimiter, &rows)?;
            Ok(rows)
        })?;
        Ok(())
    }
}

impl TabularDataSource for CsvDataSource {
    fn get_all_rows(&self) -> Result<Vec<Vec<CellValue>>> {
        let width = self.last_column()?;
        Ok(self
            .rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|i| row.get(i).map(String::as_str).unwrap_or("").into())
                    .collect()
            })
            .collect())
    }

    fn last_column(&self) -> Result<usize> {
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
            .map(|i| i + 1)
            .max()
            .unwrap_or(0))
    }

    fn insert_column_after(&mut self, column: usize) -> Result<()> {
        self.update(|rows| {
            for row in rows.iter_mut() {
                if row.len() > column {
                    row.insert(column, String::new());
                }
            }
        })
    }

    fn set_cell(&mut self, row: usize, column: usize, value: &str) -> Result<()> {
        if row == 0 || column == 0 {
            return Err(Error::Backend(format!(
                "cell positions are 1-based, got ({}, {})",
                row, column
            )));
        }
        self.update(|rows| {
            if rows.len() < row {
                rows.resize_with(row, Vec::new);
            }
            let cells = &mut rows[row - 1];
            if cells.len() < column {
                cells.resize(column, String::new());
            }
            cells[column - 1] = value.to_string();
        })
    }
}
