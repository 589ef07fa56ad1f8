//! Run driver: walks both data roots and loads every file in its own
//! transaction.

use crate::collector::collect_json_files;
use crate::transform::{
    process_log_file, process_song_file, LogFileStats, SongFileStats, TimeZoneSetting,
    TransformError,
};
use crate::warehouse::WarehouseStore;
use anyhow::{Context, Result};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub song_data_dir: PathBuf,
    pub log_data_dir: PathBuf,
    pub timezone: TimeZoneSetting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub song_files: usize,
    pub log_files: usize,
    pub songs: SongFileStats,
    pub logs: LogFileStats,
}

/// Applies `process` to every JSON file under `root`, committing after each
/// file. A failing file is rolled back and stops the run.
fn process_data<S, T, F>(store: &S, root: &Path, mut process: F) -> Result<(usize, T)>
where
    S: WarehouseStore,
    T: AddAssign + Default,
    F: FnMut(&S, &Path) -> Result<T, TransformError>,
{
    let files = collect_json_files(root);
    let total = files.len();
    info!("{} files found in {}", total, root.display());

    let mut totals = T::default();
    for (index, path) in files.iter().enumerate() {
        store.begin()?;
        match process(store, path) {
            Ok(stats) => {
                store
                    .commit()
                    .with_context(|| format!("Failed to commit {}", path.display()))?;
                totals += stats;
            }
            Err(err) => {
                error!("Failed to load {}: {}", path.display(), err);
                if let Err(rollback_err) = store.rollback() {
                    error!("Rollback failed: {}", rollback_err);
                }
                return Err(err).with_context(|| format!("Failed to load {}", path.display()));
            }
        }
        info!("{}/{} files processed.", index + 1, total);
    }
    Ok((total, totals))
}

/// Loads all song files, then all log files, into `store`.
pub fn run_pipeline<S: WarehouseStore>(store: &S, config: &PipelineConfig) -> Result<RunSummary> {
    let (song_files, songs) = process_data(store, &config.song_data_dir, |store, path| {
        process_song_file(store, path)
    })?;
    debug!("Song data loaded: {:?}", songs);

    let timezone = config.timezone;
    let (log_files, logs) = process_data(store, &config.log_data_dir, |store, path| {
        process_log_file(store, path, timezone)
    })?;
    debug!("Log data loaded: {:?}", logs);

    Ok(RunSummary {
        song_files,
        log_files,
        songs,
        logs,
    })
}
