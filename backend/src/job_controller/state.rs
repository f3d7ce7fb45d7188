//! Shared status of background merge runs.
//!
//! Handlers register a run as `Pending` and hand its id to the client. The
//! worker reports progress as `JobUpdate`s on `JobsState::tx`; a single
//! `start_job_updater` task applies them to the map that
//! `GET /api/merge/status/{job_id}` reads.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Capacity of the update channel between workers and the updater.
const UPDATE_BUFFER: usize = 100;

#[derive(Clone)]
pub struct JobsState {
    /// Latest status per run id.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// New empty state plus the receiver to give to `start_job_updater`.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn register(&self, job_id: &str) {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub job_id: String,
    pub status: JobStatus,
}

/// Apply updates until every sender is dropped.
///
/// A finished run keeps its final status; late progress for it is ignored.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        let finished = matches!(
            jobs.get(&update.job_id),
            Some(JobStatus::Completed(_) | JobStatus::Failed(_))
        );
        if !finished {
            jobs.insert(update.job_id, update.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn final_status_is_sticky() {
        let (state, rx) = JobsState::new();
        state.register("run-1").await;
        assert_eq!(state.status("run-1").await, Some(JobStatus::Pending));

        let updates = [
            JobStatus::InProgress(50),
            JobStatus::Failed("row 3: no recipient".to_string()),
            JobStatus::InProgress(100),
        ];
        for status in updates {
            state
                .tx
                .send(JobUpdate {
                    job_id: "run-1".to_string(),
                    status,
                })
                .await
                .unwrap();
        }

        // The updater stops once the only sender feeding `rx` is gone.
        let (unused_tx, _unused_rx) = mpsc::channel(1);
        let JobsState { jobs, tx } = state;
        drop(tx);
        let updater = JobsState {
            jobs: jobs.clone(),
            tx: unused_tx,
        };
        start_job_updater(updater, rx).await;

        assert_eq!(
            jobs.read().await.get("run-1"),
            Some(&JobStatus::Failed("row 3: no recipient".to_string()))
        );
    }
}
