//! Mail-merge engine: one PDF and one email per spreadsheet row.
//!
//! - `engine`: the merge pipeline and the ports it drives
//! - `store`: local SQLite/filesystem/CSV implementations of those ports
//! - `render`: PDF export of slide documents
//! - `services` / `job_controller`: the HTTP surface and background run tracking

pub mod config;
pub mod engine;
pub mod error;
pub mod job_controller;
pub mod render;
pub mod services;
pub mod store;
