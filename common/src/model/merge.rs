use serde::{Deserialize, Serialize};

/// Outcome of one fully processed row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    /// 1-based row position in the source table.
    pub sheet_row: usize,
    pub file_name: String,
    pub url: String,
    pub recipient: String,
}

/// Result of a merge run that completed every row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergeResult {
    pub job_name: String,
    pub processed: usize,
    pub rows: Vec<RowOutcome>,
}

impl MergeResult {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.processed += 1;
        self.rows.push(outcome);
    }
}
