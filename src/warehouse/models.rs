//! Row types of the songplays star schema.

/// Song dimension row.
#[derive(Clone, Debug, PartialEq)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// 0 when the release year is unknown.
    pub year: i32,
    /// Seconds.
    pub duration: f64,
}

/// Artist dimension row.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Time dimension row, keyed by the formatted wall-clock `start_time`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRecord {
    pub start_time: String,
    pub hour: u32,
    pub day: u32,
    /// Week of the year with Sunday as the first day of the week (`%U`).
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// ISO weekday, Monday = 1 .. Sunday = 7.
    pub weekday: u32,
}

/// User dimension row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserRecord {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Songplay fact row. `song_id` and `artist_id` are set only on an exact catalog match.
#[derive(Clone, Debug, PartialEq)]
pub struct SongplayRecord {
    pub start_time: String,
    pub user_id: i64,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Foreign keys resolved for a (title, artist name, duration) triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub time: usize,
    pub users: usize,
    pub songplays: usize,
}
