// ===============================
// src/history.rs
// ===============================
//
// Historical side of the engine: bucket past night orders by local hour
// over the reference nights, and estimate the week-over-week trend.
//
use ahash::AHashMap as HashMap;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};

use crate::calendar::{self, NIGHT_HOURS};
use crate::domain::OrderRecord;

/// Damping applied to the raw week-over-week swing. A single quiet or
/// busy week must not swing staffing wildly.
pub const TREND_DAMPING: f64 = 0.3;
pub const TREND_MIN: f64 = 0.85;
pub const TREND_MAX: f64 = 1.35;

/// Night-hour order counts summed across all reference nights.
#[derive(Debug, Clone)]
pub struct NightHistory {
    /// Every night hour is present, zero when no order matched.
    pub counts: HashMap<u32, u32>,
    /// Orders that survived the filter, across all nights combined.
    pub sample_size: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Trend {
    /// Bounded to [TREND_MIN, TREND_MAX]; 1.0 when the prior week is empty.
    pub coefficient: f64,
    /// round((coefficient - 1) * 100), display only.
    pub percent: i32,
    pub recent_count: usize,
    pub prior_count: usize,
}

/// Keep non-cancelled orders that fall on one of `dates` during a night
/// hour (local time), and count them per hour. Orders without a creation
/// timestamp never match.
pub fn aggregate_night_counts(
    orders: &[OrderRecord],
    dates: &[NaiveDate],
    offset: FixedOffset,
) -> NightHistory {
    let mut counts: HashMap<u32, u32> = NIGHT_HOURS.iter().map(|&h| (h, 0)).collect();
    let mut sample_size = 0usize;

    for order in orders {
        if order.status.is_cancelled() {
            continue;
        }
        let Some(created_at) = order.created_at else {
            continue;
        };
        let hour = calendar::local_hour(created_at, offset);
        if !calendar::is_night_hour(hour)
            || !dates.contains(&calendar::local_date(created_at, offset))
        {
            continue;
        }
        *counts.entry(hour).or_insert(0) += 1;
        sample_size += 1;
    }

    NightHistory {
        counts,
        sample_size,
    }
}

/// Compare the last 7 local days of night orders against the 7 days
/// before that and derive a damped, bounded scaling factor.
pub fn estimate_trend(orders: &[OrderRecord], now: DateTime<Utc>, offset: FixedOffset) -> Trend {
    let now_local = calendar::to_local(now, offset);
    let recent_start = now_local - Duration::days(7);
    let prior_start = now_local - Duration::days(14);

    let mut recent_count = 0usize;
    let mut prior_count = 0usize;
    for order in orders {
        if order.status.is_cancelled() {
            continue;
        }
        let Some(created_at) = order.created_at else {
            continue;
        };
        let local = calendar::to_local(created_at, offset);
        if !calendar::is_night_hour(local.hour()) {
            continue;
        }
        if local > recent_start && local <= now_local {
            recent_count += 1;
        } else if local > prior_start && local <= recent_start {
            prior_count += 1;
        }
    }

    let coefficient = if prior_count > 0 {
        let raw = (recent_count as f64 - prior_count as f64) / prior_count as f64;
        (1.0 + raw * TREND_DAMPING).clamp(TREND_MIN, TREND_MAX)
    } else {
        // Nothing to compare against: no adjustment, not an error.
        1.0
    };

    Trend {
        coefficient,
        percent: ((coefficient - 1.0) * 100.0).round() as i32,
        recent_count,
        prior_count,
    }
}
