use super::{read_file, TransformError};
use crate::warehouse::{ArtistRecord, SongRecord, WarehouseStore};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// One song-metadata file: a song and the artist performing it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SongFileRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    pub year: i32,
    pub duration: f64,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
}

impl SongFileRecord {
    pub fn split(self) -> (SongRecord, ArtistRecord) {
        let song = SongRecord {
            song_id: self.song_id,
            title: self.title,
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        };
        let artist = ArtistRecord {
            artist_id: self.artist_id,
            name: self.artist_name,
            location: self.artist_location,
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        };
        (song, artist)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SongFileStats {
    pub songs: usize,
    pub artists: usize,
}

impl std::ops::AddAssign for SongFileStats {
    fn add_assign(&mut self, other: Self) {
        self.songs += other.songs;
        self.artists += other.artists;
    }
}

/// Parses the first JSON value of a song file; anything after it is ignored.
pub fn parse_song_file(path: &Path) -> Result<SongFileRecord, TransformError> {
    let content = read_file(path)?;
    let mut values = serde_json::Deserializer::from_str(&content).into_iter::<SongFileRecord>();
    match values.next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(source)) => Err(TransformError::MalformedRecord {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        }),
        None => Err(TransformError::EmptyFile(path.to_path_buf())),
    }
}

/// Loads one song file into the song and artist dimensions.
pub fn process_song_file(
    store: &dyn WarehouseStore,
    path: &Path,
) -> Result<SongFileStats, TransformError> {
    let (song, artist) = parse_song_file(path)?.split();

    // The song row references its artist.
    store.upsert_artist(&artist)?;
    store.upsert_song(&song)?;

    debug!("Loaded song {} by {}", song.song_id, artist.artist_id);
    Ok(SongFileStats {
        songs: 1,
        artists: 1,
    })
}
