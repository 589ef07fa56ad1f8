//! SQLite schema of the songplays warehouse.
//!
//! Dimension tables are keyed by their natural ids. The fact table has a
//! surrogate rowid plus a unique (start_time, user_id, session_id) key so
//! reprocessing the same log never duplicates a play.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const SONG_FK: ForeignKey = ForeignKey {
    foreign_table: "songs",
    foreign_column: "song_id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const SONGPLAY_ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const TIME_FK: ForeignKey = ForeignKey {
    foreign_table: "time",
    foreign_column: "start_time",
    on_delete: ForeignKeyOnChange::Restrict,
};

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "user_id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("location", SqlType::Text),
        sqlite_column!("latitude", SqlType::Real),
        sqlite_column!("longitude", SqlType::Real),
    ],
    indices: &[("idx_artists_name", "name")],
    unique_constraints: &[],
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("song_id", SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            SqlType::Text,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("year", SqlType::Integer, non_null = true),
        sqlite_column!("duration", SqlType::Real, non_null = true),
    ],
    indices: &[
        ("idx_songs_title", "title"),
        ("idx_songs_artist", "artist_id"),
    ],
    unique_constraints: &[],
};

const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        sqlite_column!("start_time", SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("hour", SqlType::Integer, non_null = true),
        sqlite_column!("day", SqlType::Integer, non_null = true),
        sqlite_column!("week", SqlType::Integer, non_null = true),
        sqlite_column!("month", SqlType::Integer, non_null = true),
        sqlite_column!("year", SqlType::Integer, non_null = true),
        sqlite_column!("weekday", SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("user_id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("first_name", SqlType::Text),
        sqlite_column!("last_name", SqlType::Text),
        sqlite_column!("gender", SqlType::Text),
        sqlite_column!("level", SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    columns: &[
        sqlite_column!("songplay_id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "start_time",
            SqlType::Text,
            non_null = true,
            foreign_key = Some(&TIME_FK)
        ),
        sqlite_column!(
            "user_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("level", SqlType::Text),
        sqlite_column!("song_id", SqlType::Text, foreign_key = Some(&SONG_FK)),
        sqlite_column!(
            "artist_id",
            SqlType::Text,
            foreign_key = Some(&SONGPLAY_ARTIST_FK)
        ),
        sqlite_column!("session_id", SqlType::Integer, non_null = true),
        sqlite_column!("location", SqlType::Text),
        sqlite_column!("user_agent", SqlType::Text),
    ],
    indices: &[
        ("idx_songplays_user", "user_id"),
        ("idx_songplays_song", "song_id"),
    ],
    unique_constraints: &[&["start_time", "user_id", "session_id"]],
};

pub const WAREHOUSE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        SONGS_TABLE,
        TIME_TABLE,
        USERS_TABLE,
        SONGPLAYS_TABLE,
    ],
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    #[test]
    fn schema_creates_successfully() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &WAREHOUSE_VERSIONED_SCHEMAS[0];
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn songplay_key_rejects_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        WAREHOUSE_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO time VALUES ('2018-11-01 20:57:10.796', 20, 1, 43, 11, 2018, 4)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO users (user_id, level) VALUES (8, 'free')", [])
            .unwrap();

        let insert = "INSERT INTO songplays (start_time, user_id, session_id) VALUES (?1, ?2, ?3)";
        conn.execute(insert, params!["2018-11-01 20:57:10.796", 8, 139])
            .unwrap();
        assert!(conn
            .execute(insert, params!["2018-11-01 20:57:10.796", 8, 139])
            .is_err());
    }

    #[test]
    fn song_requires_existing_artist() {
        let conn = Connection::open_in_memory().unwrap();
        WAREHOUSE_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO songs VALUES ('SOABC', 'Title', 'ARMISSING', 0, 120.5)",
            [],
        );
        assert!(result.is_err());
    }
}
