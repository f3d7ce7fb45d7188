//! Runtime settings read from the environment.
//!
//! Every setting has a default so the server starts with no configuration at
//! all. A `.env` file in the working directory is honoured by `main`.

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// SQLite file holding templates, documents, setups and the outbox.
    pub database_path: PathBuf,
    /// Directory holding `<data_source_id>.csv` files.
    pub data_dir: PathBuf,
    /// Root of the output folders; each folder is a subdirectory.
    pub output_dir: PathBuf,
    /// Directory searched for the PDF font family.
    pub fonts_dir: PathBuf,
    /// Base used when building artifact URLs.
    pub public_url: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("SLIDEMERGE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("SLIDEMERGE_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Backend(format!("invalid SLIDEMERGE_PORT {:?}: {}", raw, e)))?,
            None => DEFAULT_PORT,
        };
        let public_url = get("SLIDEMERGE_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_path: get("SLIDEMERGE_DATABASE")
                .unwrap_or_else(|| "slidemerge.sqlite".to_string())
                .into(),
            data_dir: get("SLIDEMERGE_DATA_DIR")
                .unwrap_or_else(|| "data".to_string())
                .into(),
            output_dir: get("SLIDEMERGE_OUTPUT_DIR")
                .unwrap_or_else(|| "output".to_string())
                .into(),
            fonts_dir: get("SLIDEMERGE_FONTS_DIR")
                .unwrap_or_else(|| "fonts".to_string())
                .into(),
            host,
            port,
            public_url,
        })
    }

    pub fn bind_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
