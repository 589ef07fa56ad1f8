//! Data trees and warehouse databases for end-to-end tests

use super::constants::*;
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;
use sparkify_etl::transform::TimeZoneSetting;
use sparkify_etl::warehouse::SqliteWarehouseStore;
use sparkify_etl::{run_pipeline, PipelineConfig, RunSummary};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// One NextSong-style activity line; pass `page` to build other event kinds.
pub fn log_line(
    page: &str,
    user_id: i64,
    level: &str,
    ts: i64,
    song: Option<(&str, &str, f64)>,
) -> String {
    let (title, artist, length) = match song {
        Some((title, artist, length)) => (Some(title), Some(artist), Some(length)),
        None => (None, None, None),
    };
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Test",
        "gender": "F",
        "itemInSession": 0,
        "lastName": format!("User{}", user_id),
        "length": length,
        "level": level,
        "location": "Philadelphia-Camden-Wilmington, PA-NJ-DE-MD",
        "method": "PUT",
        "page": page,
        "registration": 1541044398796.0,
        "sessionId": 455,
        "song": title,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0",
        "userId": user_id.to_string(),
    })
    .to_string()
}

/// Temporary song and log trees plus a warehouse database path.
pub struct TestWarehouse {
    pub dir: TempDir,
    pub db_path: PathBuf,
}

impl TestWarehouse {
    /// Creates empty data roots with the two catalog songs already written.
    pub fn with_catalog() -> Result<Self> {
        let warehouse = Self::empty()?;
        warehouse.write_song(
            "A/A/A",
            "TRAAAAW128F429D538.json",
            SONG_1_ID,
            SONG_1_TITLE,
            ARTIST_1_ID,
            ARTIST_1_NAME,
            SONG_1_DURATION,
        )?;
        warehouse.write_song(
            "A/A/B",
            "TRAAABD128F429CF47.json",
            SONG_2_ID,
            SONG_2_TITLE,
            ARTIST_2_ID,
            ARTIST_2_NAME,
            SONG_2_DURATION,
        )?;
        Ok(warehouse)
    }

    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("song_data"))?;
        fs::create_dir_all(dir.path().join("log_data"))?;
        let db_path = dir.path().join("sparkify.db");
        Ok(Self { dir, db_path })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_song(
        &self,
        subdir: &str,
        file_name: &str,
        song_id: &str,
        title: &str,
        artist_id: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<()> {
        let dir = self.pipeline_config().song_data_dir.join(subdir);
        fs::create_dir_all(&dir)?;
        let record = json!({
            "num_songs": 1,
            "artist_id": artist_id,
            "artist_latitude": null,
            "artist_longitude": null,
            "artist_location": "",
            "artist_name": artist_name,
            "song_id": song_id,
            "title": title,
            "duration": duration,
            "year": 0,
        });
        fs::write(dir.join(file_name), record.to_string())?;
        Ok(())
    }

    pub fn write_log(&self, file_name: &str, lines: &[String]) -> Result<()> {
        let dir = self.pipeline_config().log_data_dir.join("2018/11");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file_name), lines.join("\n"))?;
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            song_data_dir: self.dir.path().join("song_data"),
            log_data_dir: self.dir.path().join("log_data"),
            timezone: TimeZoneSetting::utc(),
        }
    }

    /// Opens the warehouse, runs one full load and closes it again.
    pub fn run(&self) -> Result<RunSummary> {
        let store = SqliteWarehouseStore::open(&self.db_path)?;
        run_pipeline(&store, &self.pipeline_config())
    }

    pub fn connection(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    pub fn count(&self, table: &str) -> Result<i64> {
        let conn = self.connection()?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}
