mod file_config;

pub use file_config::FileConfig;

use crate::pipeline::PipelineConfig;
use crate::transform::TimeZoneSetting;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA_DIR: &str = "data/song_data";
pub const DEFAULT_LOG_DATA_DIR: &str = "data/log_data";
pub const DEFAULT_TIMEZONE: &str = "local";

/// CLI arguments that can be overridden by the TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub timezone: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            song_data: PathBuf::from(DEFAULT_SONG_DATA_DIR),
            log_data: PathBuf::from(DEFAULT_LOG_DATA_DIR),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub timezone: TimeZoneSetting,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.db_path.clone());
        let song_data = file
            .song_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.song_data.clone());
        let log_data = file
            .log_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.log_data.clone());

        let timezone_str = file.timezone.unwrap_or_else(|| cli.timezone.clone());
        let timezone = timezone_str
            .parse::<TimeZoneSetting>()
            .with_context(|| format!("Invalid timezone setting: {:?}", timezone_str))?;

        Ok(Self {
            db_path,
            song_data,
            log_data,
            timezone,
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            song_data_dir: self.song_data.clone(),
            log_data_dir: self.log_data.clone(),
            timezone: self.timezone,
        }
    }
}
