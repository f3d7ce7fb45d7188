use serde::{Deserialize, Serialize};

/// A configured merge setup.
///
/// `template_id` and `output_container_id` hold references as the operator
/// pasted them (usually full URLs); they are resolved to identifiers when the
/// job runs, never when it is saved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub data_source_id: String,
    pub template_id: String,
    pub output_container_id: String,
    /// Column whose value names the generated file. Empty means unset.
    #[serde(default)]
    pub file_name_field: String,
    #[serde(default)]
    pub email_field: String,
    #[serde(default)]
    pub subject_template: String,
    #[serde(default)]
    pub body_template: String,
}

impl JobConfig {
    /// Entries without a name or data source are not runnable and are hidden
    /// from job listings.
    pub fn is_listed(&self) -> bool {
        !self.name.trim().is_empty() && !self.data_source_id.trim().is_empty()
    }
}
