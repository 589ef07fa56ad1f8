//! Sparkify ETL: loads song metadata and user activity logs into a SQLite
//! star-schema warehouse.

pub mod collector;
pub mod config;
pub mod pipeline;
pub mod sqlite_persistence;
pub mod transform;
pub mod warehouse;

pub use pipeline::{run_pipeline, PipelineConfig, RunSummary};
