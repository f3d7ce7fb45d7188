use serde::{Deserialize, Serialize};

/// Metadata sent alongside an uploaded data source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// Identifier the job configs refer to as `data_source_id`.
    pub id: String,
    #[serde(default)]
    pub source_type: DataSourceType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum DataSourceType {
    #[default]
    Csv,
}

/// Returned after an upload is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub id: String,
    pub md5: String,
    pub columns: Vec<String>,
}
