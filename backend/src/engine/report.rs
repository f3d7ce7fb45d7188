use common::model::merge::MergeResult;

/// Operator-facing summary of a finished run.
pub fn summarize(result: &MergeResult) -> String {
    format!(
        "Processed {} rows for setup: {}",
        result.processed, result.job_name
    )
}
