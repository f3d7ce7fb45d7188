use serde::{Deserialize, Serialize};

/// Request payload for `POST /api/merge/start`.
///
/// A setup is chosen either by its name or by its position in the listing
/// returned by `GET /api/configs`. The name wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartMergeRequest {
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub index: Option<usize>,
}

/// Response payload for `POST /api/folders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderCreated {
    pub id: String,
    pub url: String,
}
