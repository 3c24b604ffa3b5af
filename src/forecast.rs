// ===============================
// src/forecast.rs
// ===============================
//
// Entry point of the engine: pure function of (orders, products, now).
// History -> hourly averages -> trend scaling -> staffing, plus the
// stock-risk pass over the same reference nights.
//
use chrono::{DateTime, Utc};

use crate::calendar::{self, NIGHT_HOURS};
use crate::config::EngineParams;
use crate::domain::{ForecastResult, HourlyPrediction, OrderRecord, ProductRecord};
use crate::history;
use crate::stock;

/// Predict tonight hour by hour, size the driver roster to the busiest
/// hour, and flag products likely to run short. Allocates a fresh result
/// on every call and never touches its inputs.
pub fn compute_forecast(
    orders: &[OrderRecord],
    products: &[ProductRecord],
    now: DateTime<Utc>,
    params: &EngineParams,
) -> ForecastResult {
    let offset = calendar::fixed_offset(params.utc_offset_hours);
    let reference_dates = calendar::last_n_same_weekdays(params.reference_nights, now, offset);
    let nights = reference_dates.len().max(1) as f64;

    let hist = history::aggregate_night_counts(orders, &reference_dates, offset);
    let trend = history::estimate_trend(orders, now, offset);

    let mut hourly = Vec::with_capacity(NIGHT_HOURS.len());
    let mut total_tonight = 0u32;
    let mut peak_hour = NIGHT_HOURS[0];
    let mut peak_count = 0u32;
    for &hour in NIGHT_HOURS.iter() {
        let summed = hist.counts.get(&hour).copied().unwrap_or(0) as f64;
        // Per-night average, then the damped trend adjustment.
        let predicted = ((summed / nights) * trend.coefficient).round().max(0.0) as u32;
        total_tonight += predicted;
        // Strict '>' keeps the earliest hour of the night on ties.
        if predicted > peak_count {
            peak_count = predicted;
            peak_hour = hour;
        }
        hourly.push(HourlyPrediction {
            hour,
            label: format!("{hour}h"),
            predicted_count: predicted,
        });
    }

    let stock_risks = stock::analyze_stock_risks(
        orders,
        products,
        &reference_dates,
        offset,
        trend.coefficient,
        nights,
    );

    ForecastResult {
        hourly,
        total_tonight,
        peak_hour,
        peak_count,
        drivers_needed: drivers_needed(peak_count, params.driver_capacity_per_hour),
        stock_risks,
        trend_coefficient: trend.coefficient,
        trend_percent: trend.percent,
        sample_size: hist.sample_size,
        reference_dates,
    }
}

/// Staffing sized to the single busiest hour, never below one driver.
pub(crate) fn drivers_needed(peak_count: u32, capacity_per_hour: u32) -> u32 {
    let capacity = capacity_per_hour.max(1);
    peak_count.div_ceil(capacity).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;

    fn order(id: &str, created_at: &str, items: &str) -> OrderRecord {
        OrderRecord {
            id: id.to_string(),
            created_at: Some(created_at.parse().expect("test timestamp")),
            status: OrderStatus::Delivered,
            items: items.to_string(),
            total: 10.0,
        }
    }

    fn params() -> EngineParams {
        EngineParams {
            utc_offset_hours: -3,
            driver_capacity_per_hour: 3,
            reference_nights: 3,
        }
    }

    // Local Saturday 12:00 under UTC-3. The oldest reference night
    // (21 days back) sits outside both trend windows, so histories
    // placed there see coefficient 1.0.
    const NOW: &str = "2025-03-15T15:00:00Z";

    /// 6 orders at 20h and 3 at 21h on the oldest reference night.
    fn three_night_history() -> Vec<OrderRecord> {
        let mut orders = Vec::new();
        for i in 0..6 {
            // 2025-02-22 local 20h.
            orders.push(order(&format!("a{i}"), "2025-02-22T23:15:00Z", "Vodka x1"));
        }
        for i in 0..3 {
            // 2025-02-22 local 21h.
            orders.push(order(&format!("b{i}"), "2025-02-23T00:15:00Z", "Chips"));
        }
        orders
    }

    #[test]
    fn hourly_forecast_averages_and_peaks() {
        let orders = three_night_history();
        let now = NOW.parse().unwrap();
        let res = compute_forecast(&orders, &[], now, &params());

        assert_eq!(res.trend_coefficient, 1.0);
        let by_hour = |h: u32| {
            res.hourly
                .iter()
                .find(|p| p.hour == h)
                .map(|p| p.predicted_count)
                .unwrap()
        };
        assert_eq!(by_hour(20), 2); // round(6/3)
        assert_eq!(by_hour(21), 1); // round(3/3)
        assert_eq!(res.total_tonight, 3);
        assert_eq!(res.peak_hour, 20);
        assert_eq!(res.peak_count, 2);
        assert_eq!(res.drivers_needed, 1); // max(1, ceil(2/3))
        assert_eq!(res.sample_size, 9);
        assert_eq!(res.hourly.len(), 11);
        assert_eq!(res.hourly[0].label, "20h");
    }

    #[test]
    fn total_tonight_equals_hourly_sum() {
        let orders = three_night_history();
        let now = NOW.parse().unwrap();
        let res = compute_forecast(&orders, &[], now, &params());
        let summed: u32 = res.hourly.iter().map(|p| p.predicted_count).sum();
        assert_eq!(res.total_tonight, summed);
    }

    #[test]
    fn forecast_is_idempotent() {
        let orders = three_night_history();
        let now = NOW.parse().unwrap();
        let a = compute_forecast(&orders, &[], now, &params());
        let b = compute_forecast(&orders, &[], now, &params());
        assert_eq!(a, b);
    }

    #[test]
    fn tied_peak_keeps_the_earliest_night_hour() {
        // 22h and 2h both predict 2; 22h comes first in night order.
        let mut orders = Vec::new();
        for i in 0..6 {
            // 2025-02-22 local 22h.
            orders.push(order(&format!("a{i}"), "2025-02-23T01:15:00Z", "Vodka"));
        }
        for i in 0..6 {
            // 2025-02-22 local 2h.
            orders.push(order(&format!("b{i}"), "2025-02-22T05:15:00Z", "Chips"));
        }
        let now = NOW.parse().unwrap();
        let res = compute_forecast(&orders, &[], now, &params());
        assert_eq!(res.trend_coefficient, 1.0);
        assert_eq!(res.peak_count, 2);
        assert_eq!(res.peak_hour, 22);
    }

    #[test]
    fn empty_history_still_recommends_one_driver() {
        let now = NOW.parse().unwrap();
        let res = compute_forecast(&[], &[], now, &params());
        assert_eq!(res.total_tonight, 0);
        assert_eq!(res.peak_hour, 20);
        assert_eq!(res.peak_count, 0);
        assert_eq!(res.drivers_needed, 1);
        assert_eq!(res.reference_dates.len(), 3);
    }

    #[test]
    fn stock_risks_ride_along_with_the_forecast() {
        let orders = three_night_history();
        let products = vec![
            ProductRecord {
                id: "p1".into(),
                name: "Vodka".into(),
                stock: 0,
            },
            ProductRecord {
                id: "p2".into(),
                name: "Chips".into(),
                stock: 5,
            },
        ];
        let now = NOW.parse().unwrap();
        let res = compute_forecast(&orders, &products, now, &params());
        // 6 vodkas over 3 nights, none in stock: need 2, deficit 2.
        // Chips are covered and stay silent.
        assert_eq!(res.stock_risks.len(), 1);
        assert_eq!(res.stock_risks[0].product_id, "p1");
        assert_eq!(res.stock_risks[0].predicted_need, 2);
        assert_eq!(res.stock_risks[0].deficit, 2);
    }

    #[test]
    fn staffing_never_drops_as_the_peak_grows() {
        let mut prev = 0u32;
        for peak in 0..200 {
            let d = drivers_needed(peak, 3);
            assert!(d >= 1);
            assert!(d >= prev, "drivers_needed must be monotonic in peak");
            prev = d;
        }
        assert_eq!(drivers_needed(2, 3), 1);
        assert_eq!(drivers_needed(3, 3), 1);
        assert_eq!(drivers_needed(4, 3), 2);
    }
}
