pub mod cell;
pub mod datasource;
pub mod job_config;
pub mod merge;
pub mod row;
pub mod template;
