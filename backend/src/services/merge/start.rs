//! # Merge Run Service
//!
//! `POST /api/merge/start` picks a saved setup and runs it in the background.
//!
//! 1.  The handler turns the request into a `JobSelector`, registers a new run
//!     id as `Pending` and returns the id right away.
//! 2.  A Tokio task runs `merge_blocking` under `spawn_blocking`: the runner
//!     works synchronously against SQLite, the CSV file and the PDF renderer.
//! 3.  The runner sends `MergeUpdate`s from the worker thread; a listener
//!     turns them into percentages and forwards them to the job controller.
//! 4.  The run ends as `Completed` with the summary message or as `Failed`
//!     with the error of the row that stopped it.

use crate::config::Settings;
use crate::engine::config_store::{select_job, ConfigRepository, JobSelector};
use crate::engine::report::summarize;
use crate::engine::runner::{MergeRunner, MergeUpdate};
use crate::error::Result;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::store::{
    open_database, CsvDataSources, LocalFolderStorage, SqliteConfigRepository,
    SqliteDocumentStore, SqliteOutbox,
};
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::model::merge::MergeResult;
use common::requests::StartMergeRequest;
use log::{error, info};
use tokio::sync::mpsc;
use uuid::Uuid;

/// A name wins over an index when both are given.
fn selector(req: StartMergeRequest) -> Option<JobSelector> {
    match (req.job_name, req.index) {
        (Some(name), _) if !name.trim().is_empty() => Some(JobSelector::Name(name)),
        (_, Some(index)) => Some(JobSelector::Index(index)),
        _ => None,
    }
}

/// Percentage of rows done after row `row_index` (0-based).
fn progress(row_index: usize, total_rows: usize) -> u32 {
    if total_rows > 0 {
        ((row_index + 1) as f32 / total_rows as f32 * 100.0) as u32
    } else {
        0
    }
}

/// `POST /api/merge/start`: answers with the job id right away; the run
/// continues in the background.
pub(crate) async fn process(
    state: web::Data<JobsState>,
    settings: web::Data<Settings>,
    payload: web::Json<StartMergeRequest>,
) -> impl Responder {
    let Some(selector) = selector(payload.into_inner()) else {
        return HttpResponse::BadRequest().body("Either job_name or index is required");
    };
    let job_id = schedule_merge_job(&state, settings.get_ref().clone(), selector).await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

async fn schedule_merge_job(state: &JobsState, settings: Settings, selector: JobSelector) -> String {
    let job_id = Uuid::new_v4().to_string();
    state.register(&job_id).await;

    let tx = state.tx.clone();
    let run_id = job_id.clone();

    tokio::spawn(async move {
        let (merge_tx, mut merge_rx) = mpsc::channel::<MergeUpdate>(100);

        let forward_tx = tx.clone();
        let forward_id = run_id.clone();
        tokio::spawn(async move {
            while let Some(update) = merge_rx.recv().await {
                let status = match update {
                    MergeUpdate::Job(status) => status,
                    MergeUpdate::Task {
                        row_index,
                        total_rows,
                    } => JobStatus::InProgress(progress(row_index, total_rows)),
                };
                let _ = forward_tx
                    .send(JobUpdate {
                        job_id: forward_id.clone(),
                        status,
                    })
                    .await;
            }
        });

        let handle =
            tokio::task::spawn_blocking(move || merge_blocking(&settings, &selector, merge_tx));

        let status = match handle.await {
            Ok(Ok(result)) => {
                let message = summarize(&result);
                info!("Run {}: {}", run_id, message);
                JobStatus::Completed(message)
            }
            Ok(Err(e)) => {
                error!("Run {} failed: {}", run_id, e);
                JobStatus::Failed(e.to_string())
            }
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };
        let _ = tx
            .send(JobUpdate {
                job_id: run_id,
                status,
            })
            .await;
    });

    job_id
}

/// Wire the local collaborators together and run the selected setup.
fn merge_blocking(
    settings: &Settings,
    selector: &JobSelector,
    tx: mpsc::Sender<MergeUpdate>,
) -> Result<MergeResult> {
    let configs = SqliteConfigRepository::new(open_database(&settings.database_path)?);
    let job = select_job(configs.job_configs()?, selector)?;

    let data_sources = CsvDataSources::new(&settings.data_dir);
    let documents = SqliteDocumentStore::new(
        open_database(&settings.database_path)?,
        &settings.fonts_dir,
    );
    let storage = LocalFolderStorage::new(&settings.output_dir, settings.public_url.as_str());
    let outbox = SqliteOutbox::new(open_database(&settings.database_path)?);

    MergeRunner::new(&data_sources, &documents, &storage, &outbox)
        .with_progress(tx)
        .run(&job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_takes_precedence_over_index() {
        let req = StartMergeRequest {
            job_name: Some("Badges".to_string()),
            index: Some(3),
        };
        assert_eq!(selector(req), Some(JobSelector::Name("Badges".to_string())));

        let req = StartMergeRequest {
            job_name: Some("  ".to_string()),
            index: Some(3),
        };
        assert_eq!(selector(req), Some(JobSelector::Index(3)));
        assert_eq!(selector(StartMergeRequest::default()), None);
    }

    #[test]
    fn progress_is_a_rounded_down_percentage() {
        assert_eq!(progress(0, 3), 33);
        assert_eq!(progress(2, 3), 100);
        assert_eq!(progress(0, 0), 0);
    }
}
