use serde::{Deserialize, Serialize};

/// An image embedded in a template, referenced from slide text as `[img:ID]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub base64: String,
}

/// A slide-deck template as stored by the local document store.
///
/// `text` holds every slide; slides are separated by a line containing only
/// `---`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub text: String,
    pub images: Option<Vec<Image>>,
}
