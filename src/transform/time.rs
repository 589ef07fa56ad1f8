//! Calendar fields derived from event timestamps.

use crate::warehouse::TimeRecord;
use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, Offset, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

/// Timezone in which event timestamps are turned into wall-clock times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeZoneSetting {
    /// The timezone of the machine running the load.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl TimeZoneSetting {
    pub fn utc() -> Self {
        TimeZoneSetting::Fixed(Utc.fix())
    }
}

/// Exactly two ASCII digits, no sign.
fn two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for TimeZoneSetting {
    type Err = anyhow::Error;

    /// Accepts `local`, `utc` or an offset such as `+05:30` / `-08:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(TimeZoneSetting::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(TimeZoneSetting::utc());
        }

        let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
            (1, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (-1, rest)
        } else {
            bail!("Invalid timezone {:?}, expected local, utc or +HH:MM", s);
        };
        let (hours, minutes) = rest
            .split_once(':')
            .with_context(|| format!("Invalid timezone offset {:?}, expected +HH:MM", s))?;
        let hours = two_digits(hours)
            .with_context(|| format!("Invalid hours in timezone offset {:?}", s))?;
        let minutes = two_digits(minutes)
            .with_context(|| format!("Invalid minutes in timezone offset {:?}", s))?;
        if minutes >= 60 {
            bail!("Invalid minutes in timezone offset {:?}", s);
        }

        match FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32) {
            Some(offset) => Ok(TimeZoneSetting::Fixed(offset)),
            None => bail!("Timezone offset {:?} out of range", s),
        }
    }
}

impl fmt::Display for TimeZoneSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneSetting::Local => write!(f, "local"),
            TimeZoneSetting::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Wall-clock time of an epoch-milliseconds timestamp in `tz`.
/// Returns None when the timestamp is out of range.
pub fn start_time(ts_millis: i64, tz: TimeZoneSetting) -> Option<NaiveDateTime> {
    let utc = DateTime::from_timestamp_millis(ts_millis)?;
    Some(match tz {
        TimeZoneSetting::Local => utc.with_timezone(&Local).naive_local(),
        TimeZoneSetting::Fixed(offset) => utc.with_timezone(&offset).naive_local(),
    })
}

/// Key used for `start_time` columns, e.g. `2018-11-01 20:57:10.796`.
pub fn format_start_time(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Week of the year counting Sunday as the first day; days before the first
/// Sunday fall in week 0.
fn sunday_week_of_year(time: &NaiveDateTime) -> u32 {
    (time.ordinal0() + 7 - time.weekday().num_days_from_sunday()) / 7
}

impl TimeRecord {
    pub fn derive(ts_millis: i64, tz: TimeZoneSetting) -> Option<TimeRecord> {
        let time = start_time(ts_millis, tz)?;
        Some(TimeRecord {
            start_time: format_start_time(&time),
            hour: time.hour(),
            day: time.day(),
            week: sunday_week_of_year(&time),
            month: time.month(),
            year: time.year(),
            weekday: time.weekday().number_from_monday(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(s: &str) -> TimeZoneSetting {
        s.parse().unwrap()
    }

    #[test]
    fn derives_calendar_fields_in_utc() {
        let record = TimeRecord::derive(1541105830796, TimeZoneSetting::utc()).unwrap();
        assert_eq!(
            record,
            TimeRecord {
                start_time: "2018-11-01 20:57:10.796".to_string(),
                hour: 20,
                day: 1,
                week: 43,
                month: 11,
                year: 2018,
                weekday: 4,
            }
        );
    }

    #[test]
    fn derives_calendar_fields_in_offset_zone() {
        let record = TimeRecord::derive(1541105830796, offset("-05:00")).unwrap();
        assert_eq!(record.start_time, "2018-11-01 15:57:10.796");
        assert_eq!(record.hour, 15);
        assert_eq!(record.day, 1);

        // Crosses midnight into Friday the 2nd.
        let record = TimeRecord::derive(1541105830796, offset("+05:30")).unwrap();
        assert_eq!(record.start_time, "2018-11-02 02:27:10.796");
        assert_eq!(record.day, 2);
        assert_eq!(record.weekday, 5);
    }

    #[test]
    fn derives_with_local_timezone() {
        let record = TimeRecord::derive(1541105830796, TimeZoneSetting::Local).unwrap();
        let expected = DateTime::from_timestamp_millis(1541105830796)
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(record.hour, expected.hour());
        assert_eq!(record.day, expected.day());
        assert_eq!(record.month, expected.month());
        assert_eq!(record.year, expected.year());
        assert_eq!(record.weekday, expected.weekday().number_from_monday());
    }

    #[test]
    fn sunday_week_matches_strftime() {
        // 2018-01-01 is a Monday, so the first Sunday (Jan 7th) opens week 1.
        let cases = [
            ("2018-01-01 00:00:00", 0),
            ("2018-01-06 12:00:00", 0),
            ("2018-01-07 00:00:00", 1),
            ("2018-12-31 23:59:59", 52),
            ("2017-01-01 00:00:00", 1),
        ];
        for (text, expected) in cases {
            let time = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap();
            assert_eq!(sunday_week_of_year(&time), expected, "{}", text);
            assert_eq!(time.format("%U").to_string().parse::<u32>().unwrap(), expected);
        }
    }

    #[test]
    fn weekday_is_iso() {
        // 2018-11-04 was a Sunday.
        let sunday = TimeRecord::derive(1541332800000, TimeZoneSetting::utc()).unwrap();
        assert_eq!(sunday.weekday, 7);
        let monday = TimeRecord::derive(1541419200000, TimeZoneSetting::utc()).unwrap();
        assert_eq!(monday.weekday, 1);
    }

    #[test]
    fn out_of_range_timestamp_yields_none() {
        assert!(TimeRecord::derive(i64::MAX, TimeZoneSetting::utc()).is_none());
    }

    #[test]
    fn parses_timezone_settings() {
        assert_eq!(offset("local"), TimeZoneSetting::Local);
        assert_eq!(offset("UTC"), TimeZoneSetting::utc());
        assert_eq!(
            offset("+05:30"),
            TimeZoneSetting::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert_eq!(
            offset("-08:00"),
            TimeZoneSetting::Fixed(FixedOffset::west_opt(8 * 3600).unwrap())
        );
        assert!("Mars/Olympus".parse::<TimeZoneSetting>().is_err());
        assert!("+5".parse::<TimeZoneSetting>().is_err());
        assert!("+05:75".parse::<TimeZoneSetting>().is_err());
        assert!("+30:00".parse::<TimeZoneSetting>().is_err());
        assert!("+-05:30".parse::<TimeZoneSetting>().is_err());
        assert!("-+05:00".parse::<TimeZoneSetting>().is_err());
        assert!("+5:00".parse::<TimeZoneSetting>().is_err());
        assert!("+05:3".parse::<TimeZoneSetting>().is_err());
        assert!("+05:-3".parse::<TimeZoneSetting>().is_err());
    }

    #[test]
    fn timezone_setting_displays_as_parsed() {
        assert_eq!(TimeZoneSetting::Local.to_string(), "local");
        assert_eq!(offset("+05:30").to_string(), "+05:30");
        assert_eq!(offset("-08:00").to_string(), "-08:00");
        assert_eq!(TimeZoneSetting::utc().to_string(), "+00:00");
    }
}
