//! Multipart upload of a CSV data source.
//!
//! The request carries two fields, in order: `json` with the `DataSource`
//! metadata and `file` with the CSV itself. The file is streamed to a
//! temporary file next to its destination and only replaces
//! `<data_dir>/<id>.csv` once its header has been checked, under the same
//! writer lock merge runs take. The response
//! reports the MD5 of the uploaded bytes and the header columns.

use crate::config::Settings;
use crate::store::csv_source::{detect_delimiter, with_file_lock};
use crate::store::CsvDataSources;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::datasource::{DataSource, DataSourceInfo};
use futures_util::StreamExt;
use log::info;
use md5::Context;
use serde_json::from_slice;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

type UploadResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Split and check a header line. Every column needs a non-empty title.
fn header_columns(header: &str) -> UploadResult<Vec<String>> {
    let header = header.trim_start_matches('\u{feff}');
    if header.trim().is_empty() {
        return Err("CSV header must not be empty".into());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(detect_delimiter(header))
        .from_reader(header.as_bytes());
    let record = match reader.records().next() {
        Some(record) => record?,
        None => return Err("CSV header must not be empty".into()),
    };

    let columns: Vec<String> = record.iter().map(|cell| cell.trim().to_string()).collect();
    if columns.iter().any(String::is_empty) {
        return Err("CSV header cells must not be empty".into());
    }
    Ok(columns)
}

/// Everything before the first line break, without a trailing `\r`.
fn first_line(buf: &[u8]) -> &[u8] {
    let line = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => &buf[..pos],
        None => buf,
    };
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// `POST /api/data_sources/csv/upload`. Any failure is a 400 with the reason.
pub async fn process(settings: web::Data<Settings>, payload: Multipart) -> impl Responder {
    match upload_data_source(&settings, payload).await {
        Ok(info) => HttpResponse::Ok().json(info),
        Err(e) => HttpResponse::BadRequest().body(format!("Error: {}", e)),
    }
}

/// Store the uploaded file as `<data_dir>/<id>.csv`, replacing any earlier
/// upload with the same id.
pub async fn upload_data_source(
    settings: &Settings,
    mut payload: Multipart,
) -> UploadResult<DataSourceInfo> {
    let sources = CsvDataSources::new(&settings.data_dir);
    fs::create_dir_all(&settings.data_dir)?;

    let mut data_source: Option<DataSource> = None;
    let mut stored: Option<(NamedTempFile, Vec<String>, String)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                data_source = Some(from_slice(&bytes)?);
            }
            Some("file") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if !filename.to_lowercase().ends_with(".csv") {
                    return Err("The file must end with .csv".into());
                }
                if data_source.is_none() {
                    return Err("DataSource JSON must be sent before the file".into());
                }

                let mut tmp = NamedTempFile::new_in(&settings.data_dir)?;
                let mut hasher = Context::new();
                let mut header_buf: Vec<u8> = Vec::new();
                let mut header_done = false;

                while let Some(chunk) = field.next().await {
                    let chunk = chunk?;
                    hasher.consume(&chunk);
                    tmp.write_all(&chunk)?;
                    if !header_done {
                        header_buf.extend_from_slice(&chunk);
                        header_done = header_buf.contains(&b'\n');
                    }
                }
                tmp.flush()?;

                let header = std::str::from_utf8(first_line(&header_buf))
                    .map_err(|_| "Header is not valid UTF-8")?;
                let columns = header_columns(header)?;
                stored = Some((tmp, columns, format!("{:x}", hasher.finalize())));
            }
            _ => {}
        }
    }

    let ds = data_source.ok_or("Missing DataSource")?;
    let (tmp, columns, md5) = stored.ok_or("Missing file")?;
    let path = sources
        .path_for(&ds.id)
        .ok_or("DataSource id contains unsupported characters")?;
    // A merge run may be writing result cells into the same file.
    with_file_lock(&path, || tmp.persist(&path)).map_err(|e| e.error)?;

    info!(
        "Stored data source {} ({} columns, md5 {})",
        ds.id,
        columns.len(),
        md5
    );
    Ok(DataSourceInfo {
        id: ds.id,
        md5,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_columns_follow_the_detected_delimiter() {
        assert_eq!(
            header_columns("Name;E-mail;Course").unwrap(),
            ["Name", "E-mail", "Course"]
        );
        assert_eq!(
            header_columns("\u{feff}\"Full name\", Email").unwrap(),
            ["Full name", "Email"]
        );
    }

    #[test]
    fn blank_header_cells_are_rejected() {
        assert!(header_columns("Name,,Email").is_err());
        assert!(header_columns("   ").is_err());
    }

    #[test]
    fn first_line_strips_crlf() {
        assert_eq!(first_line(b"Name,Email\r\nAnn,a@x.com"), b"Name,Email");
        assert_eq!(first_line(b"Name"), b"Name");
    }
}
