//! In-memory warehouse store.
//!
//! Mirrors the key discipline of the SQLite store without a database, for
//! exercising the transformers and the driver in isolation.

use super::models::*;
use super::trait_def::{SongLookup, WarehouseStore};
use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct MemoryTables {
    pub songs: BTreeMap<String, SongRecord>,
    pub artists: BTreeMap<String, ArtistRecord>,
    pub time: BTreeMap<String, TimeRecord>,
    pub users: BTreeMap<i64, UserRecord>,
    pub songplays: BTreeMap<(String, i64, i64), SongplayRecord>,
}

#[derive(Default)]
pub struct MemoryWarehouseStore {
    committed: RefCell<MemoryTables>,
    pending: RefCell<Option<MemoryTables>>,
}

impl MemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the committed tables.
    pub fn snapshot(&self) -> MemoryTables {
        self.committed.borrow().clone()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut MemoryTables) -> T) -> T {
        let mut pending = self.pending.borrow_mut();
        match pending.as_mut() {
            Some(tables) => f(tables),
            None => f(&mut *self.committed.borrow_mut()),
        }
    }
}

impl SongLookup for MemoryWarehouseStore {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        Ok(self.with_tables(|tables| {
            tables.songs.values().find_map(|song| {
                let artist = tables.artists.get(&song.artist_id)?;
                (song.title == title && artist.name == artist_name && song.duration == duration)
                    .then(|| SongMatch {
                        song_id: song.song_id.clone(),
                        artist_id: artist.artist_id.clone(),
                    })
            })
        }))
    }
}

impl WarehouseStore for MemoryWarehouseStore {
    fn upsert_song(&self, song: &SongRecord) -> Result<()> {
        self.with_tables(|tables| {
            if !tables.artists.contains_key(&song.artist_id) {
                bail!("Song {} references unknown artist {}", song.song_id, song.artist_id);
            }
            tables.songs.insert(song.song_id.clone(), song.clone());
            Ok(())
        })
    }

    fn upsert_artist(&self, artist: &ArtistRecord) -> Result<()> {
        self.with_tables(|tables| {
            tables
                .artists
                .insert(artist.artist_id.clone(), artist.clone());
        });
        Ok(())
    }

    fn upsert_time(&self, time: &TimeRecord) -> Result<()> {
        self.with_tables(|tables| {
            tables
                .time
                .entry(time.start_time.clone())
                .or_insert_with(|| time.clone());
        });
        Ok(())
    }

    fn upsert_user(&self, user: &UserRecord) -> Result<()> {
        self.with_tables(|tables| {
            tables.users.insert(user.user_id, user.clone());
        });
        Ok(())
    }

    fn upsert_songplay(&self, songplay: &SongplayRecord) -> Result<()> {
        self.with_tables(|tables| {
            if !tables.time.contains_key(&songplay.start_time) {
                bail!("Songplay references unknown time {}", songplay.start_time);
            }
            if !tables.users.contains_key(&songplay.user_id) {
                bail!("Songplay references unknown user {}", songplay.user_id);
            }
            let key = (
                songplay.start_time.clone(),
                songplay.user_id,
                songplay.session_id,
            );
            tables.songplays.insert(key, songplay.clone());
            Ok(())
        })
    }

    fn begin(&self) -> Result<()> {
        let mut pending = self.pending.borrow_mut();
        if pending.is_some() {
            bail!("A transaction is already open");
        }
        *pending = Some(self.committed.borrow().clone());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        match self.pending.borrow_mut().take() {
            Some(tables) => {
                *self.committed.borrow_mut() = tables;
                Ok(())
            }
            None => bail!("No open transaction to commit"),
        }
    }

    fn rollback(&self) -> Result<()> {
        match self.pending.borrow_mut().take() {
            Some(_) => Ok(()),
            None => bail!("No open transaction to roll back"),
        }
    }

    fn counts(&self) -> Result<TableCounts> {
        Ok(self.with_tables(|tables| TableCounts {
            songs: tables.songs.len(),
            artists: tables.artists.len(),
            time: tables.time.len(),
            users: tables.users.len(),
            songplays: tables.songplays.len(),
        }))
    }
}
