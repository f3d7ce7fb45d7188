//! The per-row merge pipeline.
//!
//! For one job the runner resolves its references, reads the entire data
//! source, then walks the non-blank rows strictly in table order:
//!
//! clone template → substitute → save → export PDF → store → share →
//! compose mail → write URL back → send → trash the clone.
//!
//! There is no retry and no rollback. The first failing row aborts the run;
//! rows already processed keep their artifacts, URLs and sent mail, so
//! re-running a job after a failure processes every row again.

use crate::engine::ports::{
    ArtifactStorage, Attachment, ContainerRef, DataSourceProvider, DocumentRef, DocumentStore,
    Messenger, OutgoingMessage, TabularDataSource, PDF_MIME,
};
use crate::engine::reference::extract_id;
use crate::engine::rows::extract_rows_within;
use crate::engine::token::{apply_template, substitute};
use crate::error::{Error, Result};
use common::jobs::JobStatus;
use common::model::cell::CellValue;
use common::model::job_config::JobConfig;
use common::model::merge::{MergeResult, RowOutcome};
use common::model::row::RowRecord;
use log::{debug, info, warn};
use tokio::sync::mpsc;

/// Title of the column receiving artifact URLs.
pub const RESULT_COLUMN_TITLE: &str = "Doc/PDF URL";

/// Progress sent while a run is underway.
#[derive(Debug)]
pub enum MergeUpdate {
    /// Overall status change.
    Job(JobStatus),
    /// Row `row_index` (0-based among non-blank rows) is done.
    Task { row_index: usize, total_rows: usize },
}

/// Where URLs are written and how much of the header is row data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResultColumn {
    /// 1-based column index.
    column: usize,
    /// The column must be created before the first write.
    insert: bool,
    /// Number of leading header cells that form the row schema.
    schema_width: usize,
}

impl ResultColumn {
    fn locate(header: &[CellValue], last_column: usize) -> Self {
        let width = header.len();
        let titled = header
            .last()
            .is_some_and(|cell| cell.to_string() == RESULT_COLUMN_TITLE);

        if titled {
            Self {
                column: width,
                insert: false,
                schema_width: width - 1,
            }
        } else {
            Self {
                column: width + 1,
                insert: last_column == width,
                schema_width: width,
            }
        }
    }
}

/// File name for a row's artifact: the configured column's value, or
/// `Document_<sheet row>` when the column is unset or empty for that row.
pub fn artifact_name(row: &RowRecord, file_name_field: &str) -> String {
    let base = if file_name_field.is_empty() {
        String::new()
    } else {
        row.text(file_name_field)
    };
    if base.trim().is_empty() {
        format!("Document_{}.pdf", row.sheet_row())
    } else {
        format!("{}.pdf", base)
    }
}

fn resolve<'r>(reference: &'r str, kind: &'static str) -> Result<&'r str> {
    extract_id(reference).ok_or_else(|| Error::ReferenceResolution {
        kind,
        reference: reference.to_string(),
    })
}

/// Drives one job at a time against injected collaborators.
pub struct MergeRunner<'a> {
    data_sources: &'a dyn DataSourceProvider,
    documents: &'a dyn DocumentStore,
    storage: &'a dyn ArtifactStorage,
    messenger: &'a dyn Messenger,
    progress: Option<mpsc::Sender<MergeUpdate>>,
}

impl<'a> MergeRunner<'a> {
    pub fn new(
        data_sources: &'a dyn DataSourceProvider,
        documents: &'a dyn DocumentStore,
        storage: &'a dyn ArtifactStorage,
        messenger: &'a dyn Messenger,
    ) -> Self {
        Self {
            data_sources,
            documents,
            storage,
            messenger,
            progress: None,
        }
    }

    /// Report progress on `tx`. Updates are sent with `blocking_send`, so a
    /// runner with progress must run off the async executor (for example in
    /// `spawn_blocking`).
    pub fn with_progress(mut self, tx: mpsc::Sender<MergeUpdate>) -> Self {
        self.progress = Some(tx);
        self
    }

    fn report(&self, update: MergeUpdate) {
        if let Some(tx) = &self.progress {
            let _ = tx.blocking_send(update);
        }
    }

    pub fn run(&self, job: &JobConfig) -> Result<MergeResult> {
        info!("Starting merge job {:?}", job.name);
        self.report(MergeUpdate::Job(JobStatus::InProgress(0)));

        let template_id = resolve(&job.template_id, "template")?;
        let folder_id = resolve(&job.output_container_id, "output folder")?;

        let mut source = self
            .data_sources
            .open(&job.data_source_id)?
            .ok_or_else(|| Error::DataSourceNotFound(job.data_source_id.clone()))?;
        let template = self
            .documents
            .get_by_id(template_id)?
            .ok_or_else(|| Error::TemplateNotFound(template_id.to_string()))?;
        let folder = self
            .storage
            .get_by_id(folder_id)?
            .ok_or_else(|| Error::ContainerNotFound(folder_id.to_string()))?;

        // Everything is read before the first side effect.
        let grid = source.get_all_rows()?;
        let header = grid
            .first()
            .ok_or_else(|| Error::EmptyDataSource(job.data_source_id.clone()))?;
        let placement = ResultColumn::locate(header, source.last_column()?);
        let (_, rows) = extract_rows_within(&grid, placement.schema_width)?;

        if placement.insert {
            source.insert_column_after(placement.column - 1)?;
            source.set_cell(1, placement.column, RESULT_COLUMN_TITLE)?;
        }

        let total_rows = rows.len();
        debug!(
            "Job {:?}: {} rows to process, results in column {}",
            job.name, total_rows, placement.column
        );

        let mut result = MergeResult::new(&job.name);
        for (position, row) in rows.iter().enumerate() {
            match self.process_row(job, &template, &folder, source.as_mut(), placement.column, row)
            {
                Ok(outcome) => result.record(outcome),
                Err(e) => {
                    warn!(
                        "Job {:?} aborted at sheet row {} after {} processed rows: {}",
                        job.name,
                        row.sheet_row(),
                        result.processed,
                        e
                    );
                    return Err(e);
                }
            }
            self.report(MergeUpdate::Task {
                row_index: position,
                total_rows,
            });
        }

        info!(
            "Merge job {:?} finished: {} rows processed",
            job.name, result.processed
        );
        Ok(result)
    }

    /// Runs one row. The clone made here is trashed before returning, also
    /// when a later step fails.
    fn process_row(
        &self,
        job: &JobConfig,
        template: &DocumentRef,
        folder: &ContainerRef,
        source: &mut dyn TabularDataSource,
        result_column: usize,
        row: &RowRecord,
    ) -> Result<RowOutcome> {
        let copy = self.documents.clone_into(template, folder)?;
        debug!("Row {}: cloned template into {}", row.sheet_row(), copy.id);

        let outcome = self.merge_row(job, &copy, folder, source, result_column, row);
        match &outcome {
            Ok(_) => self.documents.trash(&copy)?,
            Err(_) => {
                if let Err(e) = self.documents.trash(&copy) {
                    warn!("Could not trash working copy {}: {}", copy.id, e);
                }
            }
        }
        outcome
    }

    fn merge_row(
        &self,
        job: &JobConfig,
        copy: &DocumentRef,
        folder: &ContainerRef,
        source: &mut dyn TabularDataSource,
        result_column: usize,
        row: &RowRecord,
    ) -> Result<RowOutcome> {
        let content = apply_template(self.documents.open(copy)?, row);
        self.documents.save_and_close(copy, content)?;

        let blob = self.documents.export_as(copy, PDF_MIME)?;
        let file = self
            .storage
            .create_file(folder, &blob, &artifact_name(row, &job.file_name_field))?;
        self.storage.set_public_view_access(&file)?;
        let url = self.storage.get_url(&file)?;

        let subject = substitute(&job.subject_template, row);
        let body = substitute(&job.body_template, row);

        source.set_cell(row.sheet_row(), result_column, &url)?;

        let recipient = row.text(&job.email_field).trim().to_string();
        if job.email_field.is_empty() || recipient.is_empty() {
            return Err(Error::MissingRecipient {
                row: row.sheet_row(),
                field: job.email_field.clone(),
            });
        }

        self.messenger.send(&OutgoingMessage {
            to: recipient.clone(),
            subject,
            body,
            attachments: vec![Attachment {
                name: file.name.clone(),
                content_type: blob.content_type,
                bytes: blob.bytes,
            }],
        })?;
        debug!("Row {}: sent {} to {}", row.sheet_row(), file.name, recipient);

        Ok(RowOutcome {
            sheet_row: row.sheet_row(),
            file_name: file.name,
            url,
            recipient,
        })
    }
}
