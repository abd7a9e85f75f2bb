//! Conversion between Apple's Mac-epoch nanosecond timestamps and local datetimes.
//!
//! The iMessage database stores `message.date` as nanoseconds elapsed since
//! 2001-01-01 00:00:00 UTC. All dates exposed to the rest of the pipeline are
//! naive local civil timestamps; query windows are converted back through
//! `to_mac_timestamp` so a local date range spans UTC-midnight and DST
//! boundaries correctly.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

/// Unix seconds of the Mac epoch (2001-01-01 00:00:00 UTC)
const MAC_EPOCH_UNIX_SECS: i64 = 978_307_200;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Convert a Mac nanosecond timestamp (UTC-based) to a local civil datetime.
///
/// A value of exactly zero is the Mac epoch itself, expressed in local time.
#[must_use]
pub fn to_local_datetime(mac_ts: i64) -> NaiveDateTime {
    let secs = MAC_EPOCH_UNIX_SECS + mac_ts.div_euclid(NANOS_PER_SEC);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = mac_ts.rem_euclid(NANOS_PER_SEC) as u32;
    let utc = DateTime::<Utc>::from_timestamp(secs, nanos).unwrap_or_default();
    Local.from_utc_datetime(&utc.naive_utc()).naive_local()
}

/// Convert a local civil datetime to a Mac nanosecond timestamp.
///
/// The input is treated as wall-clock time in the local zone, resolved using
/// the zone's historical offset at that instant. Ambiguous wall times during a
/// DST fall-back resolve to the earlier UTC offset; nonexistent wall times
/// inside a spring-forward gap are shifted forward one hour.
#[must_use]
pub fn to_mac_timestamp(local: NaiveDateTime) -> i64 {
    let utc = match Local.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => Local
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map_or_else(|| Utc.from_utc_datetime(&local), |dt| dt.with_timezone(&Utc)),
    };

    let secs = utc.timestamp() - MAC_EPOCH_UNIX_SECS;
    secs * NANOS_PER_SEC + i64::from(utc.timestamp_subsec_nanos())
}
