use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_DB_PATH, DEFAULT_LOG_DATA_DIR,
    DEFAULT_SONG_DATA_DIR, DEFAULT_TIMEZONE,
};
use sparkify_etl::run_pipeline;
use sparkify_etl::warehouse::{SqliteWarehouseStore, WarehouseStore};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[clap(about = "Load song metadata and activity logs into the Sparkify warehouse")]
struct CliArgs {
    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite warehouse database file.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Root directory of the song metadata files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_SONG_DATA_DIR)]
    pub song_data: PathBuf,

    /// Root directory of the activity log files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_LOG_DATA_DIR)]
    pub log_data: PathBuf,

    /// Timezone for event timestamps: local, utc or an offset like -08:00.
    #[clap(long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        song_data: cli_args.song_data,
        log_data: cli_args.log_data,
        timezone: cli_args.timezone,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening SQLite warehouse database at {:?}...", config.db_path);
    let store = SqliteWarehouseStore::open(&config.db_path)?;

    info!(
        "Loading {:?} and {:?} with timezone {}",
        config.song_data, config.log_data, config.timezone
    );
    let started = Instant::now();
    let summary = run_pipeline(&store, &config.pipeline_config())?;
    let counts = store.counts()?;

    info!("Load completed in {:.2?}", started.elapsed());
    info!(
        "Song files: {}, log files: {}, play events: {} ({} skipped, {} matched)",
        summary.song_files,
        summary.log_files,
        summary.logs.plays,
        summary.logs.skipped_events,
        summary.logs.matched_songplays
    );
    info!(
        "Warehouse rows: {} songs, {} artists, {} time, {} users, {} songplays",
        counts.songs, counts.artists, counts.time, counts.users, counts.songplays
    );
    Ok(())
}
