// ===============================
// src/main.rs
// ===============================
//
// nightops_rust: operational load intelligence for a night-delivery
// storefront. Polls an order/product snapshot on a fixed interval, runs
// the pure forecasting core (hourly demand, driver headcount, stock
// risks) plus the surge/boost calculation, exposes Prometheus metrics,
// and records JSONL results.
//
// The forecast is tolerant of slight staleness, so a 60s poll beats
// recomputing on every store change. The core itself does no I/O.
//
mod calendar;
mod config;
mod domain;
mod forecast;
mod history;
mod lineitem;
mod metrics;
mod recorder;
mod snapshot;
mod stock;
mod surge;

use chrono::Utc;
use tokio::{
    sync::mpsc,
    time::{interval, Duration, Instant, MissedTickBehavior},
};
use tracing::{error, info};

use crate::domain::Event;
use crate::snapshot::StoreClient;

#[tokio::main]
async fn main() {
    // ---- Logging ----
    tracing_subscriber::fmt().with_env_filter("info").init();

    // ---- Load config & engine constants ----
    let (args, params) = config::load();

    // ---- Metrics ----
    metrics::init();
    tokio::spawn(metrics::serve_metrics(args.metrics_port));

    info!(
        store_mode = %args.store_mode.as_str(),
        store_base = %args.store_base_url,
        poll_secs = args.poll_secs,
        lookback_days = args.lookback_days,
        utc_offset_hours = params.utc_offset_hours,
        driver_capacity = params.driver_capacity_per_hour,
        reference_nights = params.reference_nights,
        "startup config"
    );
    metrics::CONFIG_STORE_MODE
        .with_label_values(&[args.store_mode.as_str()])
        .set(1);
    metrics::CONFIG_POLL_SECS.set(args.poll_secs as i64);

    // ---- Recorder (optional) ----
    let (rec_tx, rec_rx) = mpsc::channel::<Event>(1024);
    if let Some(path) = args.record_file.clone() {
        tokio::spawn(recorder::run(rec_rx, path));
    }

    let client = match args.store_mode {
        config::StoreMode::Http => Some(StoreClient::new(args.store_base_url.clone())),
        config::StoreMode::Mock => None,
    };

    // ---- Polling loop ----
    let mut tick = interval(Duration::from_secs(args.poll_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;
        let now = Utc::now();

        let snap = match &client {
            Some(c) => match c.fetch_snapshot(now, args.lookback_days).await {
                Ok(s) => s,
                Err(e) => {
                    error!(?e, "snapshot fetch failed, skipping tick");
                    metrics::SNAPSHOT_ERRORS.inc();
                    continue;
                }
            },
            None => snapshot::mock_snapshot(now, args.lookback_days, params.utc_offset_hours),
        };
        metrics::SNAPSHOT_ORDERS.set(snap.orders.len() as i64);
        metrics::SNAPSHOT_PRODUCTS.set(snap.products.len() as i64);
        metrics::PENDING_ORDERS.set(snap.pending_orders as i64);
        metrics::ACTIVE_DRIVERS.set(snap.active_drivers as i64);

        let started = Instant::now();
        let result = forecast::compute_forecast(&snap.orders, &snap.products, now, &params);
        metrics::COMPUTE_MS.observe(started.elapsed().as_secs_f64() * 1000.0);

        let boost = surge::compute_surge_bonus(snap.pending_orders, snap.active_drivers, now);

        metrics::FORECAST_RUNS.inc();
        metrics::PREDICTED_TOTAL.set(result.total_tonight as i64);
        for p in &result.hourly {
            metrics::PREDICTED_BY_HOUR
                .with_label_values(&[&p.label])
                .set(p.predicted_count as i64);
        }
        metrics::PEAK_HOUR.set(result.peak_hour as i64);
        metrics::PEAK_COUNT.set(result.peak_count as i64);
        metrics::DRIVERS_NEEDED.set(result.drivers_needed as i64);
        metrics::TREND_COEFFICIENT.set(result.trend_coefficient);
        metrics::SAMPLE_SIZE.set(result.sample_size as i64);
        metrics::STOCK_RISKS.set(result.stock_risks.len() as i64);
        metrics::SURGE_ACTIVE.set(boost.is_active as i64);
        metrics::SURGE_BONUS.set(boost.bonus_amount);
        metrics::SURGE_RATIO.set(boost.ratio);

        info!(
            total_tonight = result.total_tonight,
            peak_hour = result.peak_hour,
            peak_count = result.peak_count,
            drivers_needed = result.drivers_needed,
            trend_percent = result.trend_percent,
            stock_risks = result.stock_risks.len(),
            sample_size = result.sample_size,
            surge_active = boost.is_active,
            surge_bonus = boost.bonus_amount,
            "forecast tick"
        );

        let _ = rec_tx.try_send(Event::Forecast(result));
        let _ = rec_tx.try_send(Event::Surge(boost));
    }
}
