// ===============================
// src/config.rs
// ===============================
use std::env;

use dotenvy::dotenv;

/// Where the polling loop gets its snapshots from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreMode {
    /// Synthetic orders/products, no storefront needed.
    Mock,
    /// Storefront REST API (read-only).
    Http,
}

impl StoreMode {
    pub fn from_env(key: &str, default_mode: StoreMode) -> StoreMode {
        match env::var(key).unwrap_or_default().to_ascii_lowercase().as_str() {
            "mock" => StoreMode::Mock,
            "http" | "rest" => StoreMode::Http,
            _ => default_mode,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreMode::Mock => "mock",
            StoreMode::Http => "http",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Args {
    pub store_mode: StoreMode,
    pub store_base_url: String,

    // files/metrics
    pub record_file: Option<String>,
    pub metrics_port: u16,

    // polling loop
    pub poll_secs: u64,
    /// Hard cap on how far back the snapshot fetch reaches (cost control).
    pub lookback_days: i64,
}

/// Operational constants of the forecasting core. Everything here is a
/// business knob, not a tuning parameter of the polling harness.
#[derive(Clone, Debug)]
pub struct EngineParams {
    /// Fixed local offset in hours (default -3). No DST rules; the
    /// storefront operates on a single fixed offset by design.
    pub utc_offset_hours: i32,
    /// Deliveries one driver completes per hour.
    pub driver_capacity_per_hour: u32,
    /// How many past same-weekday nights feed the hourly averages.
    pub reference_nights: usize,
}

pub fn load() -> (Args, EngineParams) {
    // Read .env first so RECORD_FILE, STORE_MODE etc. are picked up.
    let _ = dotenv();

    // ===== Snapshot source =====
    let store_mode = StoreMode::from_env("STORE_MODE", StoreMode::Mock);
    let store_base_url =
        env::var("STORE_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

    let record_file = env::var("RECORD_FILE").ok();
    let metrics_port = env::var("METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9898);

    // ===== Polling loop =====
    let poll_secs = env::var("POLL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
    let lookback_days = env::var("LOOKBACK_DAYS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|d| *d > 0)
        .unwrap_or(21);

    let args = Args {
        store_mode,
        store_base_url,
        record_file,
        metrics_port,
        poll_secs,
        lookback_days,
    };

    // ===== Engine constants =====
    let utc_offset_hours = env::var("UTC_OFFSET_HOURS")
        .ok()
        .and_then(|s| s.parse::<i32>().ok())
        .map(|h| h.clamp(-23, 23))
        .unwrap_or(-3);
    let driver_capacity_per_hour = env::var("DRIVER_CAPACITY_PER_HOUR")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|c| *c > 0)
        .unwrap_or(3);
    let reference_nights = env::var("REFERENCE_NIGHTS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(3);

    let params = EngineParams {
        utc_offset_hours,
        driver_capacity_per_hour,
        reference_nights,
    };
    (args, params)
}
