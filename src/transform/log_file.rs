use super::time::{format_start_time, start_time, TimeZoneSetting};
use super::{read_file, TransformError};
use crate::warehouse::{SongLookup, SongplayRecord, TimeRecord, UserRecord, WarehouseStore};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Page value of events that represent an actual song playback.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Accepts integers, integral floats and numeric strings; anything else
/// (including the empty string logged for anonymous users) reads as absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// One line of an activity log.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub ts: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl LogEvent {
    pub fn is_next_song(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }
}

/// A NextSong event complete enough to produce time, user and songplay rows.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayEvent {
    pub ts: i64,
    pub user_id: i64,
    pub session_id: i64,
    pub time: TimeRecord,
    pub event: LogEvent,
}

impl PlayEvent {
    /// Returns None when the event's timestamp cannot be converted or its user
    /// or session is missing; such an event produces no rows at all.
    pub fn from_event(event: LogEvent, tz: TimeZoneSetting) -> Option<PlayEvent> {
        let ts = event.ts?;
        let time = TimeRecord::derive(ts, tz)?;
        Some(PlayEvent {
            ts,
            user_id: event.user_id?,
            session_id: event.session_id?,
            time,
            event,
        })
    }

    pub fn user(&self) -> UserRecord {
        UserRecord {
            user_id: self.user_id,
            first_name: self.event.first_name.clone(),
            last_name: self.event.last_name.clone(),
            gender: self.event.gender.clone(),
            level: self.event.level.clone(),
        }
    }

    fn songplay(
        &self,
        tz: TimeZoneSetting,
        lookup: &dyn SongLookup,
    ) -> anyhow::Result<Option<SongplayRecord>> {
        let Some(start_time) = start_time(self.ts, tz) else {
            return Ok(None);
        };

        let found = match (&self.event.song, &self.event.artist, self.event.length) {
            (Some(title), Some(artist), Some(length)) => lookup.find_song(title, artist, length)?,
            _ => None,
        };
        let (song_id, artist_id) = match found {
            Some(found) => (Some(found.song_id), Some(found.artist_id)),
            None => (None, None),
        };

        Ok(Some(SongplayRecord {
            start_time: format_start_time(&start_time),
            user_id: self.user_id,
            level: self.event.level.clone(),
            song_id,
            artist_id,
            session_id: self.session_id,
            location: self.event.location.clone(),
            user_agent: self.event.user_agent.clone(),
        }))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogFileStats {
    pub events: usize,
    pub plays: usize,
    pub skipped_events: usize,
    pub time_rows: usize,
    pub user_rows: usize,
    pub songplays: usize,
    pub matched_songplays: usize,
}

impl std::ops::AddAssign for LogFileStats {
    fn add_assign(&mut self, other: Self) {
        self.events += other.events;
        self.plays += other.plays;
        self.skipped_events += other.skipped_events;
        self.time_rows += other.time_rows;
        self.user_rows += other.user_rows;
        self.songplays += other.songplays;
        self.matched_songplays += other.matched_songplays;
    }
}

/// Parses a newline-delimited JSON log. Blank lines are ignored, a malformed
/// line fails the whole file.
pub fn parse_log_file(path: &Path) -> Result<Vec<LogEvent>, TransformError> {
    let content = read_file(path)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<LogEvent>(line).map_err(|source| {
                TransformError::MalformedRecord {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                }
            })
        })
        .collect()
}

/// Distinct user rows, ordered by the position of their last occurrence so
/// the latest event of each user is written last.
pub fn distinct_users(plays: &[PlayEvent]) -> Vec<UserRecord> {
    let mut last_seen: HashMap<UserRecord, usize> = HashMap::new();
    for (index, play) in plays.iter().enumerate() {
        last_seen.insert(play.user(), index);
    }
    let mut users: Vec<(UserRecord, usize)> = last_seen.into_iter().collect();
    users.sort_by_key(|(_, index)| *index);
    users.into_iter().map(|(user, _)| user).collect()
}

fn load_plays(
    store: &dyn WarehouseStore,
    lookup: &dyn SongLookup,
    plays: &[PlayEvent],
    tz: TimeZoneSetting,
    stats: &mut LogFileStats,
) -> Result<(), TransformError> {
    for play in plays {
        store.upsert_time(&play.time)?;
        stats.time_rows += 1;
    }

    for user in distinct_users(plays) {
        store.upsert_user(&user)?;
        stats.user_rows += 1;
    }

    for play in plays {
        let Some(songplay) = play.songplay(tz, lookup)? else {
            continue;
        };
        if songplay.song_id.is_some() {
            stats.matched_songplays += 1;
        }
        store.upsert_songplay(&songplay)?;
        stats.songplays += 1;
    }
    Ok(())
}

/// Loads one activity log into the time, user and songplay tables.
pub fn process_log_file<S: WarehouseStore>(
    store: &S,
    path: &Path,
    tz: TimeZoneSetting,
) -> Result<LogFileStats, TransformError> {
    let events = parse_log_file(path)?;
    let mut stats = LogFileStats {
        events: events.len(),
        ..Default::default()
    };

    let mut plays = Vec::new();
    for (index, event) in events.into_iter().enumerate() {
        if !event.is_next_song() {
            continue;
        }
        stats.plays += 1;
        match PlayEvent::from_event(event, tz) {
            Some(play) => plays.push(play),
            None => {
                debug!(
                    "Skipping incomplete play event #{} in {}",
                    index + 1,
                    path.display()
                );
                stats.skipped_events += 1;
            }
        }
    }

    load_plays(store, store, &plays, tz, &mut stats)?;

    debug!("Loaded {}: {:?}", path.display(), stats);
    Ok(stats)
}
