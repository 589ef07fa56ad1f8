//! SQLite-backed warehouse store.

use super::models::*;
use super::schema::WAREHOUSE_VERSIONED_SCHEMAS;
use super::trait_def::{SongLookup, WarehouseStore};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::info;

pub struct SqliteWarehouseStore {
    conn: Connection,
}

/// Creates the latest schema on an empty database, otherwise checks that the
/// stored schema is the one this build writes to.
fn prepare_schema(conn: &Connection) -> Result<()> {
    let latest_version = WAREHOUSE_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &WAREHOUSE_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating warehouse db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .context("Failed to read database version")?;
    let expected = (BASE_DB_VERSION + latest_version) as i64;
    if db_version != expected {
        bail!(
            "Unknown warehouse db version {} (expected {})",
            db_version,
            expected
        );
    }

    latest_schema
        .validate(conn)
        .context("Warehouse schema validation failed")
}

impl SqliteWarehouseStore {
    /// Opens (creating if needed) the warehouse database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open warehouse database {:?}", db_path))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Enforcement is per connection, not stored in the file.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        prepare_schema(&conn)?;
        Ok(SqliteWarehouseStore { conn })
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

impl SongLookup for SqliteWarehouseStore {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT songs.song_id, artists.artist_id
             FROM songs JOIN artists ON songs.artist_id = artists.artist_id
             WHERE songs.title = ?1 AND artists.name = ?2 AND songs.duration = ?3",
        )?;
        let found = stmt
            .query_row(params![title, artist_name, duration], |row| {
                Ok(SongMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(found)
    }
}

impl WarehouseStore for SqliteWarehouseStore {
    fn upsert_song(&self, song: &SongRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO songs (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(song_id) DO UPDATE SET
                    title = excluded.title,
                    artist_id = excluded.artist_id,
                    year = excluded.year,
                    duration = excluded.duration",
            )?
            .execute(params![
                &song.song_id,
                &song.title,
                &song.artist_id,
                song.year,
                song.duration
            ])
            .with_context(|| format!("Failed to upsert song {}", song.song_id))?;
        Ok(())
    }

    fn upsert_artist(&self, artist: &ArtistRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(artist_id) DO UPDATE SET
                    name = excluded.name,
                    location = excluded.location,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude",
            )?
            .execute(params![
                &artist.artist_id,
                &artist.name,
                &artist.location,
                artist.latitude,
                artist.longitude
            ])
            .with_context(|| format!("Failed to upsert artist {}", artist.artist_id))?;
        Ok(())
    }

    fn upsert_time(&self, time: &TimeRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(start_time) DO NOTHING",
            )?
            .execute(params![
                &time.start_time,
                time.hour,
                time.day,
                time.week,
                time.month,
                time.year,
                time.weekday
            ])?;
        Ok(())
    }

    fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO users (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    gender = excluded.gender,
                    level = excluded.level",
            )?
            .execute(params![
                user.user_id,
                &user.first_name,
                &user.last_name,
                &user.gender,
                &user.level
            ])
            .with_context(|| format!("Failed to upsert user {}", user.user_id))?;
        Ok(())
    }

    fn upsert_songplay(&self, songplay: &SongplayRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO songplays
                    (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(start_time, user_id, session_id) DO UPDATE SET
                    level = excluded.level,
                    song_id = excluded.song_id,
                    artist_id = excluded.artist_id,
                    location = excluded.location,
                    user_agent = excluded.user_agent",
            )?
            .execute(params![
                &songplay.start_time,
                songplay.user_id,
                &songplay.level,
                &songplay.song_id,
                &songplay.artist_id,
                songplay.session_id,
                &songplay.location,
                &songplay.user_agent
            ])
            .with_context(|| {
                format!(
                    "Failed to upsert songplay ({}, {}, {})",
                    songplay.start_time, songplay.user_id, songplay.session_id
                )
            })?;
        Ok(())
    }

    fn begin(&self) -> Result<()> {
        self.conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    fn counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            songs: self.count_rows("songs")?,
            artists: self.count_rows("artists")?,
            time: self.count_rows("time")?,
            users: self.count_rows("users")?,
            songplays: self.count_rows("songplays")?,
        })
    }
}
