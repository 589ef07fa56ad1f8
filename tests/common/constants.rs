//! Shared constants for end-to-end tests

// ============================================================================
// Song catalog
// ============================================================================

pub const ARTIST_1_ID: &str = "ARD7TVE1187B99BFB1";
pub const ARTIST_1_NAME: &str = "Casual";

pub const SONG_1_ID: &str = "SOMZWCG12A8C13C480";
pub const SONG_1_TITLE: &str = "I Didn't Mean To";
pub const SONG_1_DURATION: f64 = 218.93179;

pub const ARTIST_2_ID: &str = "ARMJAGH1187FB546F3";
pub const ARTIST_2_NAME: &str = "The Box Tops";

pub const SONG_2_ID: &str = "SOCIWDW12A8C13D406";
pub const SONG_2_TITLE: &str = "Soul Deep";
pub const SONG_2_DURATION: f64 = 148.03546;

// ============================================================================
// Activity
// ============================================================================

pub const USER_1_ID: i64 = 69;
pub const USER_2_ID: i64 = 8;

/// 2018-11-11 02:33:56.796 UTC
pub const TS_1: i64 = 1541903636796;
/// 2018-11-11 02:36:10.796 UTC
pub const TS_2: i64 = 1541903770796;
/// 2018-11-12 10:00:00.000 UTC
pub const TS_3: i64 = 1542016800000;
