//! Output folders as directories under a common root.
//!
//! Link sharing is recorded in a `.sharing.json` manifest per folder; only
//! files listed there are served over HTTP.

use crate::engine::ports::{ArtifactStorage, Blob, ContainerRef, FileRef};
use crate::error::{Error, Result};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SHARING_MANIFEST: &str = ".sharing.json";
const VIEW: &str = "anyone_with_link:view";

#[derive(Debug, Clone)]
pub struct LocalFolderStorage {
    root: PathBuf,
    public_url: String,
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\'])
        && segment != ".."
}

impl LocalFolderStorage {
    /// Folders live under `root`; links are built from `public_url`.
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a new, empty folder and return its id.
    pub fn create_container(&self) -> Result<ContainerRef> {
        let id = Uuid::new_v4().simple().to_string();
        fs::create_dir_all(self.root.join(&id))?;
        Ok(ContainerRef { id })
    }

    pub fn container_url(&self, container: &ContainerRef) -> String {
        format!("{}/files/{}", self.public_url, container.id)
    }

    fn folder(&self, id: &str) -> Option<PathBuf> {
        is_safe_segment(id).then(|| self.root.join(id))
    }

    fn manifest_path(folder: &Path) -> PathBuf {
        folder.join(SHARING_MANIFEST)
    }

    fn read_manifest(folder: &Path) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(Self::manifest_path(folder)) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of a link-shared file, `None` if it does not exist or is private.
    pub fn shared_file(&self, container_id: &str, name: &str) -> Result<Option<PathBuf>> {
        let Some(folder) = self.folder(container_id) else {
            return Ok(None);
        };
        if !is_safe_segment(name) {
            return Ok(None);
        }
        let manifest = Self::read_manifest(&folder)?;
        let path = folder.join(name);
        Ok((manifest.get(name).map(String::as_str) == Some(VIEW) && path.is_file()).then_some(path))
    }

    /// First free name: `name`, then `stem (1).ext`, `stem (2).ext`, ...
    fn unique_name(folder: &Path, name: &str) -> String {
        if !folder.join(name).exists() {
            return name.to_string();
        }
        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name, ""),
        };
        (1..)
            .map(|n| format!("{} ({}){}", stem, n, ext))
            .find(|candidate| !folder.join(candidate).exists())
            .unwrap_or_else(|| name.to_string())
    }
}

impl ArtifactStorage for LocalFolderStorage {
    fn get_by_id(&self, id: &str) -> Result<Option<ContainerRef>> {
        Ok(self
            .folder(id)
            .filter(|path| path.is_dir())
            .map(|_| ContainerRef { id: id.to_string() }))
    }

    fn create_file(&self, container: &ContainerRef, blob: &Blob, name: &str) -> Result<FileRef> {
        let folder = self
            .folder(&container.id)
            .ok_or_else(|| Error::ContainerNotFound(container.id.clone()))?;
        let cleaned = name.replace(['/', '\\'], "_");
        let cleaned = cleaned.trim_start_matches('.');
        let name = Self::unique_name(&folder, if cleaned.is_empty() { "file" } else { cleaned });

        fs::write(folder.join(&name), &blob.bytes)?;
        debug!("Stored {} ({} bytes) in folder {}", name, blob.bytes.len(), container.id);
        Ok(FileRef {
            container_id: container.id.clone(),
            id: format!("{}/{}", container.id, name),
            name,
        })
    }

    fn set_public_view_access(&self, file: &FileRef) -> Result<()> {
        let folder = self
            .folder(&file.container_id)
            .ok_or_else(|| Error::ContainerNotFound(file.container_id.clone()))?;
        let mut manifest = Self::read_manifest(&folder)?;
        manifest.insert(file.name.clone(), VIEW.to_string());
        fs::write(
            Self::manifest_path(&folder),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(())
    }

    fn get_url(&self, file: &FileRef) -> Result<String> {
        Ok(format!(
            "{}/files/{}/{}",
            self.public_url,
            file.container_id,
            urlencoding::encode(&file.name)
        ))
    }
}
