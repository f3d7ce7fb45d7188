use serde::Serialize;

/// Status of a background merge run as reported to polling clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum JobStatus {
    Pending,
    /// Percentage of data rows processed so far.
    InProgress(u32),
    /// Operator-facing summary of the finished run.
    Completed(String),
    Failed(String),
}
