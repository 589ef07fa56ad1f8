//! Persistence port used by the transformers.

use super::models::{
    ArtistRecord, SongMatch, SongRecord, SongplayRecord, TableCounts, TimeRecord, UserRecord,
};
use anyhow::Result;

/// Read access to the song/artist dimensions.
pub trait SongLookup {
    /// Returns the song and artist ids of the catalog entry whose title, artist
    /// name and duration all equal the given values exactly.
    /// Returns None when nothing matches.
    fn find_song(&self, title: &str, artist_name: &str, duration: f64)
        -> Result<Option<SongMatch>>;
}

/// Write access to the warehouse. Every upsert is keyed on the table's natural
/// key, so writing the same row twice leaves a single row behind.
pub trait WarehouseStore: SongLookup {
    fn upsert_song(&self, song: &SongRecord) -> Result<()>;

    fn upsert_artist(&self, artist: &ArtistRecord) -> Result<()>;

    /// Time rows derive deterministically from their key, an existing row is kept.
    fn upsert_time(&self, time: &TimeRecord) -> Result<()>;

    /// Replaces the non-key columns of an existing user (last write wins).
    fn upsert_user(&self, user: &UserRecord) -> Result<()>;

    /// Keyed on (start_time, user_id, session_id).
    fn upsert_songplay(&self, songplay: &SongplayRecord) -> Result<()>;

    /// Opens the unit of work for one input file.
    fn begin(&self) -> Result<()>;

    fn commit(&self) -> Result<()>;

    /// Discards everything written since `begin`.
    fn rollback(&self) -> Result<()>;

    fn counts(&self) -> Result<TableCounts>;
}
