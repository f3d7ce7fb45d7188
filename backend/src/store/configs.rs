//! Merge setups stored one row per job.

use crate::engine::config_store::ConfigRepository;
use crate::error::{Error, Result};
use common::model::job_config::JobConfig;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "name, data_source_id, template_ref, output_ref, file_name_field, \
                       email_field, subject_template, body_template";

/// Merge setups, one row per setup name.
pub struct SqliteConfigRepository {
    conn: Connection,
}

impl SqliteConfigRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<JobConfig> {
        Ok(JobConfig {
            name: row.get(0)?,
            data_source_id: row.get(1)?,
            template_id: row.get(2)?,
            output_container_id: row.get(3)?,
            file_name_field: row.get(4)?,
            email_field: row.get(5)?,
            subject_template: row.get(6)?,
            body_template: row.get(7)?,
        })
    }
}

impl ConfigRepository for SqliteConfigRepository {
    fn job_configs(&self) -> Result<Vec<JobConfig>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM job_configs
             WHERE trim(name) <> '' AND trim(data_source_id) <> ''
             ORDER BY rowid",
            COLUMNS
        ))?;
        let configs = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(configs)
    }

    fn get_config(&self, id: &str) -> Result<JobConfig> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM job_configs WHERE name = ?1", COLUMNS),
                params![id],
                Self::from_row,
            )
            .optional()?
            .ok_or_else(|| Error::ConfigNotFound(id.to_string()))
    }

    fn save_config(&self, config: &JobConfig) -> Result<()> {
        // Upsert keeps the rowid, so an edited job keeps its listing position.
        self.conn.execute(
            &format!(
                "INSERT INTO job_configs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(name) DO UPDATE SET
                    data_source_id = excluded.data_source_id,
                    template_ref = excluded.template_ref,
                    output_ref = excluded.output_ref,
                    file_name_field = excluded.file_name_field,
                    email_field = excluded.email_field,
                    subject_template = excluded.subject_template,
                    body_template = excluded.body_template",
                COLUMNS
            ),
            params![
                &config.name,
                &config.data_source_id,
                &config.template_id,
                &config.output_container_id,
                &config.file_name_field,
                &config.email_field,
                &config.subject_template,
                &config.body_template,
            ],
        )?;
        Ok(())
    }
}
