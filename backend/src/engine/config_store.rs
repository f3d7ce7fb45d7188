//! Where job configurations live.
//!
//! The runner never reads configuration storage itself; callers pick a
//! [`ConfigRepository`] and hand the runner a `JobConfig`. Whether configs are
//! global, per data source, or one row per job is decided by which
//! implementation is injected.

use crate::error::{Error, Result};
use common::model::job_config::JobConfig;
use std::collections::HashMap;
use std::sync::Mutex;

pub trait ConfigRepository {
    /// Runnable configs (non-empty name and data source) in insertion order.
    fn job_configs(&self) -> Result<Vec<JobConfig>>;

    fn get_config(&self, id: &str) -> Result<JobConfig>;

    /// Insert or replace. Nothing is validated here; bad references and
    /// unknown columns surface when the job runs.
    fn save_config(&self, config: &JobConfig) -> Result<()>;
}

/// How an operator picks the setup to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSelector {
    Name(String),
    /// 0-based position in the [`ConfigRepository::job_configs`] listing.
    Index(usize),
}

/// Pick one config out of a listing.
pub fn select_job(configs: Vec<JobConfig>, selector: &JobSelector) -> Result<JobConfig> {
    if configs.is_empty() {
        return Err(Error::ConfigurationMissing);
    }
    match selector {
        JobSelector::Name(name) => configs
            .into_iter()
            .find(|c| &c.name == name)
            .ok_or_else(|| Error::ConfigNotFound(name.clone())),
        JobSelector::Index(index) => configs
            .into_iter()
            .nth(*index)
            .ok_or_else(|| Error::ConfigNotFound(format!("#{}", index))),
    }
}

/// Process-local configs keyed by job name.
#[derive(Debug, Default)]
pub struct InMemoryConfigRepository {
    configs: Mutex<Vec<JobConfig>>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigRepository for InMemoryConfigRepository {
    fn job_configs(&self) -> Result<Vec<JobConfig>> {
        let configs = self.configs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(configs.iter().filter(|c| c.is_listed()).cloned().collect())
    }

    fn get_config(&self, id: &str) -> Result<JobConfig> {
        let configs = self.configs.lock().unwrap_or_else(|e| e.into_inner());
        configs
            .iter()
            .find(|c| c.name == id)
            .cloned()
            .ok_or_else(|| Error::ConfigNotFound(id.to_string()))
    }

    fn save_config(&self, config: &JobConfig) -> Result<()> {
        let mut configs = self.configs.lock().unwrap_or_else(|e| e.into_inner());
        match configs.iter_mut().find(|c| c.name == config.name) {
            Some(existing) => *existing = config.clone(),
            None => configs.push(config.clone()),
        }
        Ok(())
    }
}

/// Flat string key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write all pairs together.
    fn set_many(&self, values: &HashMap<String, String>) -> Result<()>;
}

/// Key-value store held in memory.
#[derive(Debug, Default)]
pub struct MemoryProperties {
    values: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryProperties {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set_many(&self, values: &HashMap<String, String>) -> Result<()> {
        let mut stored = self.values.lock().unwrap_or_else(|e| e.into_inner());
        stored.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

const INDEX_KEY: &str = "jobs";

/// One config per data source, flattened into a key-value store.
///
/// Configs are addressed by their `data_source_id`; saving a config for a
/// data source that already has one replaces it.
pub struct PropertyConfigRepository<K> {
    store: K,
}

impl<K: KeyValueStore> PropertyConfigRepository<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> K {
        self.store
    }

    fn key(data_source_id: &str, field: &str) -> String {
        format!("job.{}.{}", data_source_id, field)
    }

    fn index(&self) -> Result<Vec<String>> {
        match self.store.get(INDEX_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn field(&self, data_source_id: &str, field: &str) -> Result<String> {
        Ok(self
            .store
            .get(&Self::key(data_source_id, field))?
            .unwrap_or_default())
    }

    fn load(&self, data_source_id: &str) -> Result<Option<JobConfig>> {
        let Some(name) = self.store.get(&Self::key(data_source_id, "name"))? else {
            return Ok(None);
        };
        Ok(Some(JobConfig {
            name,
            data_source_id: data_source_id.to_string(),
            template_id: self.field(data_source_id, "template")?,
            output_container_id: self.field(data_source_id, "folder")?,
            file_name_field: self.field(data_source_id, "fileNameField")?,
            email_field: self.field(data_source_id, "emailField")?,
            subject_template: self.field(data_source_id, "subject")?,
            body_template: self.field(data_source_id, "body")?,
        }))
    }
}

impl<K: KeyValueStore> ConfigRepository for PropertyConfigRepository<K> {
    fn job_configs(&self) -> Result<Vec<JobConfig>> {
        let mut configs = Vec::new();
        for id in self.index()? {
            if let Some(config) = self.load(&id)? {
                if config.is_listed() {
                    configs.push(config);
                }
            }
        }
        Ok(configs)
    }

    fn get_config(&self, id: &str) -> Result<JobConfig> {
        self.load(id)?
            .ok_or_else(|| Error::ConfigNotFound(id.to_string()))
    }

    fn save_config(&self, config: &JobConfig) -> Result<()> {
        let id = config.data_source_id.as_str();
        let mut values = HashMap::from([
            (Self::key(id, "name"), config.name.clone()),
            (Self::key(id, "template"), config.template_id.clone()),
            (Self::key(id, "folder"), config.output_container_id.clone()),
            (Self::key(id, "fileNameField"), config.file_name_field.clone()),
            (Self::key(id, "emailField"), config.email_field.clone()),
            (Self::key(id, "subject"), config.subject_template.clone()),
            (Self::key(id, "body"), config.body_template.clone()),
        ]);

        let mut index = self.index()?;
        if !index.iter().any(|existing| existing == id) {
            index.push(id.to_string());
            values.insert(INDEX_KEY.to_string(), serde_json::to_string(&index)?);
        }
        self.store.set_many(&values)
    }
}
