//! Timestamp helpers: epoch seconds <-> UTC datetimes, the CSV datetime
//! layout (`YYYY-MM-DD HH:MM:SS`), and the half-open fetch window.

use anyhow::{anyhow, Context, Result};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

/// Convert epoch seconds to a UTC datetime.
pub fn from_epoch(secs: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(secs).with_context(|| format!("epoch {secs} out of range"))
}

/// Render as `YYYY-MM-DD HH:MM:SS` (UTC), the layout used in the CSV files.
pub fn format_csv(ts: OffsetDateTime) -> String {
    let ts = ts.to_offset(time::UtcOffset::UTC);
    ts.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

/// Render as RFC 3339, the layout used on the HTTP surface.
pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| format_csv(ts))
}

/// Parse a timestamp in any of the layouts we produce or accept:
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (both UTC), RFC 3339,
/// or bare epoch seconds.
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime> {
    let s = s.trim();
    if let Ok(dt) = PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day] [hour]:[minute]:[second]")) {
        return Ok(dt.assume_utc());
    }
    if let Ok(dt) = PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]")) {
        return Ok(dt.assume_utc());
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt);
    }
    if let Ok(secs) = s.parse::<i64>() {
        return from_epoch(secs);
    }
    Err(anyhow!("unrecognized timestamp: {s:?}"))
}

/// Parse `YYYY-MM-DD` into epoch seconds at UTC midnight.
pub fn parse_date_epoch(s: &str) -> Result<i64> {
    let parts: Vec<_> = s.trim().split('-').collect();
    if parts.len() != 3 {
        return Err(anyhow!("expected YYYY-MM-DD, got {s:?}"));
    }
    let year: i32 = parts[0].parse().with_context(|| format!("invalid year in {s:?}"))?;
    let month: u8 = parts[1].parse().with_context(|| format!("invalid month in {s:?}"))?;
    let day: u8 = parts[2].parse().with_context(|| format!("invalid day in {s:?}"))?;
    date_epoch(year, month, day)
}

/// Epoch seconds of `year-month-day 00:00:00 UTC`.
pub fn date_epoch(year: i32, month: u8, day: u8) -> Result<i64> {
    let month = Month::try_from(month).map_err(|e| anyhow!("invalid month {month}: {e}"))?;
    let date = Date::from_calendar_date(year, month, day).map_err(|e| anyhow!("invalid date: {e}"))?;
    Ok(date.midnight().assume_utc().unix_timestamp())
}

/// Half-open window `[after, before)` in epoch seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub after: i64,
    pub before: i64,
}

impl TimeWindow {
    pub fn new(after: i64, before: i64) -> Self {
        Self { after, before }
    }

    #[inline]
    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.after && ts < self.before
    }

    pub fn is_empty(&self) -> bool {
        self.before <= self.after
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |t: i64| from_epoch(t).map(format_csv).unwrap_or_else(|_| t.to_string());
        write!(f, "[{}, {})", show(self.after), show(self.before))
    }
}

/// serde reader for the CSV datetime column.
pub mod csv_datetime {
    use serde::{Deserialize, Deserializer};
    use time::OffsetDateTime;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// serde adapter for the HTTP surface: writes RFC 3339, reads any accepted layout.
pub mod api_datetime {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(ts: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_rfc3339(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Archive payloads carry `created_utc` as an integer, occasionally as a float.
pub mod epoch_seconds {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let raw: Option<Raw> = Option::deserialize(d)?;
        Ok(match raw {
            None => None,
            Some(Raw::Int(v)) => Some(v),
            Some(Raw::Float(v)) => Some(v.trunc() as i64),
            Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().map(|v| v.trunc() as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_layout_round_trips_through_parse() {
        let ts = from_epoch(1_651_444_841).unwrap();
        let text = format_csv(ts);
        assert_eq!(text, "2022-05-01 22:40:41");
        assert_eq!(parse_timestamp(&text).unwrap(), ts);
    }

    #[test]
    fn parse_accepts_iso_and_epoch() {
        let expected = from_epoch(1_651_444_841).unwrap();
        assert_eq!(parse_timestamp("2022-05-01T22:40:41").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-05-01T22:40:41Z").unwrap(), expected);
        assert_eq!(parse_timestamp("1651444841").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn window_is_half_open() {
        let w = TimeWindow::new(date_epoch(2020, 1, 1).unwrap(), date_epoch(2020, 1, 2).unwrap());
        assert!(w.contains(w.after));
        assert!(w.contains(w.before - 1));
        assert!(!w.contains(w.before));
        assert!(!w.contains(w.after - 1));
    }

    #[test]
    fn date_epoch_rejects_bad_dates() {
        assert_eq!(parse_date_epoch("2020-01-01").unwrap(), 1_577_836_800);
        assert!(parse_date_epoch("2020-13-01").is_err());
        assert!(parse_date_epoch("2020/01/01").is_err());
    }
}
