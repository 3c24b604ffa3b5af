// ===============================
// src/calendar.rs
// ===============================
//
// Calendar arithmetic for the night shift. All stored timestamps are UTC;
// the storefront runs on a single fixed offset (default UTC-3), so local
// time is plain offset arithmetic. Known limitation: no DST rules.
// "Fixing" this would silently move historical bucket boundaries.
//
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};

/// The 11 local hours of the night shift, in chronological order.
/// The window spans midnight: 20h..23h then 0h..6h.
pub const NIGHT_HOURS: [u32; 11] = [20, 21, 22, 23, 0, 1, 2, 3, 4, 5, 6];

/// Build the fixed local offset from configured hours. Input is clamped
/// at config load, so the conversion cannot fail.
pub fn fixed_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.clamp(-23, 23) * 3600).expect("clamped offset is in range")
}

pub fn to_local(ts: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    ts.with_timezone(&offset)
}

pub fn local_hour(ts: DateTime<Utc>, offset: FixedOffset) -> u32 {
    to_local(ts, offset).hour()
}

pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    to_local(ts, offset).date_naive()
}

pub fn is_night_hour(hour: u32) -> bool {
    hour >= 20 || hour <= 6
}

/// The `n` most recent local dates strictly before today that share
/// today's weekday, nearest first. Walks back one calendar day at a time.
pub fn last_n_same_weekdays(n: usize, now: DateTime<Utc>, offset: FixedOffset) -> Vec<NaiveDate> {
    let today = local_date(now, offset);
    let weekday = today.weekday();
    let mut out = Vec::with_capacity(n);
    let mut cursor = today;
    while out.len() < n {
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
        if cursor.weekday() == weekday {
            out.push(cursor);
        }
    }
    out
}
