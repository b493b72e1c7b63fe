//! Timestamp destinations and the text heuristic behind them.
//!
//! Text that cannot be parsed becomes [`zero_timestamp`]; the assignment still
//! counts as successful.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::{Coerce, Dynamic, Kind};

/// Literal timestamps that mean "no time set".
const ZERO_SENTINELS: [&str; 2] = ["0000-00-00 00:00:00", "0001-01-01 00:00:00"];

const DATE_TIME_FRACTION: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_TIME_FRACTION_OFFSET: &str = "%Y-%m-%d %H:%M:%S%.f %:z";
const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";
const DATE: &str = "%Y-%m-%d";

/// `0001-01-01T00:00:00Z`.
pub fn zero_timestamp() -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        .unwrap_or_default()
}

pub fn is_zero_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> bool {
    ts.fixed_offset() == zero_timestamp()
}

/// Parses timestamp text, falling back to [`zero_timestamp`].
///
/// Offset-less forms are read in the local time zone.
pub fn parse_timestamp(text: &str) -> DateTime<FixedOffset> {
    let s = text.trim();
    if ZERO_SENTINELS.contains(&s) {
        return zero_timestamp();
    }

    let parsed = if !s.contains(&['-', ' ', ':'][..]) {
        s.parse().ok().and_then(from_epoch_seconds)
    } else if s.len() > 19 && s.contains('-') {
        parse_rfc3339(s)
            .or_else(|| in_local(NaiveDateTime::parse_from_str(s, DATE_TIME_FRACTION).ok()?))
            .or_else(|| parse_with_offset(s))
    } else if s.len() == 19 && s.contains('-') {
        NaiveDateTime::parse_from_str(s, DATE_TIME)
            .ok()
            .and_then(in_local)
    } else if s.len() == 10 && s.as_bytes()[4] == b'-' && s.as_bytes()[7] == b'-' {
        NaiveDate::parse_from_str(s, DATE)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(in_local)
    } else {
        None
    };

    parsed.unwrap_or_else(zero_timestamp)
}

/// RFC 3339 with the `T` separator only; chrono also accepts a space there.
fn parse_rfc3339(s: &str) -> Option<DateTime<FixedOffset>> {
    if s.as_bytes().get(10) != Some(&b'T') {
        return None;
    }
    DateTime::parse_from_rfc3339(s).ok()
}

/// `%:z` does not accept a bare `Z`, so it is rewritten to `+00:00` first.
fn parse_with_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    match s.strip_suffix(" Z") {
        Some(head) => {
            DateTime::parse_from_str(&format!("{head} +00:00"), DATE_TIME_FRACTION_OFFSET).ok()
        }
        None => DateTime::parse_from_str(s, DATE_TIME_FRACTION_OFFSET).ok(),
    }
}

fn in_local(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

fn from_epoch_seconds(secs: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(secs, 0).map(|utc| utc.with_timezone(&Local).fixed_offset())
}

/// The timestamp a source denotes, or `None` if the source is not accepted.
fn timestamp_from(src: &Dynamic) -> Option<DateTime<FixedOffset>> {
    match src {
        Dynamic::Time(t) => Some(*t),
        Dynamic::Int(secs) => Some(from_epoch_seconds(*secs).unwrap_or_else(zero_timestamp)),
        Dynamic::Str(s) => Some(parse_timestamp(s)),
        Dynamic::Bytes(b) => Some(parse_timestamp(&String::from_utf8_lossy(b))),
        _ => None,
    }
}

macro_rules! impl_timestamp {
    ($($t:ty => $from_fixed:ident),+ $(,)?) => {
        $(
            impl Coerce for $t {
                const KIND: Kind = Kind::Time;

                fn assign(&mut self, src: &Dynamic) -> bool {
                    match timestamp_from(src) {
                        Some(ts) => {
                            *self = $from_fixed(ts);
                            true
                        }
                        None => false,
                    }
                }

                fn convert(src: &Dynamic) -> Option<Self> {
                    match src {
                        Dynamic::Time(t) => Some($from_fixed(*t)),
                        _ => None,
                    }
                }
            }
        )+
    };
}

fn keep(ts: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    ts
}

fn to_utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

fn to_local(ts: DateTime<FixedOffset>) -> DateTime<Local> {
    ts.with_timezone(&Local)
}

/// Wall-clock time in the offset the timestamp was read with.
fn to_naive(ts: DateTime<FixedOffset>) -> NaiveDateTime {
    ts.naive_local()
}

impl_timestamp!(
    DateTime<FixedOffset> => keep,
    DateTime<Utc> => to_utc,
    DateTime<Local> => to_local,
    NaiveDateTime => to_naive,
);
