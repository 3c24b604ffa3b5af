// ===============================
// src/surge.rs
// ===============================
//
// Per-delivery boost derived from live dispatch pressure: the ratio of
// undispatched orders to online drivers. Independent of the forecaster;
// recomputed on every poll and persisted by the caller for payouts.
//
use chrono::{DateTime, Utc};

use crate::domain::SurgeResult;

/// (minimum ratio, bonus) tiers, highest qualifying tier wins.
pub const SURGE_TIERS: [(f64, f64); 3] = [(4.0, 5.00), (3.0, 3.00), (2.0, 1.50)];

/// Pure function of its inputs; `now` only stamps the result.
pub fn compute_surge_bonus(
    pending_orders: u32,
    active_drivers: u32,
    now: DateTime<Utc>,
) -> SurgeResult {
    // No driver online is maximal pressure: every pending order counts full.
    let ratio = if active_drivers > 0 {
        pending_orders as f64 / active_drivers as f64
    } else {
        pending_orders as f64
    };

    let bonus_amount = SURGE_TIERS
        .iter()
        .find(|(min_ratio, _)| ratio >= *min_ratio)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0);
    let is_active = bonus_amount > 0.0;

    let reason = if active_drivers == 0 && pending_orders > 0 {
        format!("{pending_orders} pending orders with no driver online")
    } else if is_active {
        format!(
            "{pending_orders} pending orders for {active_drivers} online drivers (ratio {ratio:.1})"
        )
    } else {
        format!("normal load: {pending_orders} pending orders, {active_drivers} online drivers")
    };

    SurgeResult {
        is_active,
        bonus_amount,
        ratio,
        pending_orders,
        active_drivers,
        reason,
        computed_at: now,
    }
}
