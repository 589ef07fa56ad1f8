//! Raw JSON records to warehouse rows.

mod log_file;
mod song_file;
mod time;

pub use log_file::{
    distinct_users, parse_log_file, process_log_file, LogEvent, LogFileStats, PlayEvent,
    NEXT_SONG_PAGE,
};
pub use song_file::{parse_song_file, process_song_file, SongFileRecord, SongFileStats};
pub use time::{format_start_time, start_time, TimeZoneSetting};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort processing of one input file.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record in {path:?} at line {line}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No record found in {0:?}")]
    EmptyFile(PathBuf),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

fn read_file(path: &std::path::Path) -> Result<String, TransformError> {
    std::fs::read_to_string(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })
}
