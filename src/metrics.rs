// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Polling loop --------
pub static FORECAST_RUNS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("forecast_runs_total", "completed forecast computations").unwrap());

pub static SNAPSHOT_ERRORS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("snapshot_errors_total", "failed snapshot fetches").unwrap());

pub static COMPUTE_MS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(HistogramOpts::new(
        "forecast_compute_ms",
        "Time spent in compute_forecast (ms)",
    ))
    .unwrap()
});

// -------- Snapshot shape --------
pub static SNAPSHOT_ORDERS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("snapshot_orders", "orders in the last snapshot").unwrap());

pub static SNAPSHOT_PRODUCTS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("snapshot_products", "products in the last snapshot").unwrap());

pub static PENDING_ORDERS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("dispatch_pending_orders", "orders awaiting a driver").unwrap());

pub static ACTIVE_DRIVERS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("dispatch_active_drivers", "drivers currently online").unwrap());

// -------- Forecast output --------
pub static PREDICTED_TOTAL: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("forecast_total_tonight", "predicted orders tonight").unwrap());

pub static PREDICTED_BY_HOUR: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("forecast_hourly", "predicted orders per night hour"),
        &["hour"],
    )
    .unwrap()
});

pub static PEAK_HOUR: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("forecast_peak_hour", "busiest predicted local hour").unwrap());

pub static PEAK_COUNT: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("forecast_peak_count", "orders predicted at the peak hour").unwrap());

pub static DRIVERS_NEEDED: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("forecast_drivers_needed", "recommended driver headcount").unwrap());

pub static TREND_COEFFICIENT: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "forecast_trend_coefficient",
        "bounded week-over-week adjustment factor",
    )
    .unwrap()
});

pub static SAMPLE_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("forecast_sample_orders", "orders behind the hourly averages").unwrap()
});

pub static STOCK_RISKS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("stock_risk_products", "products flagged for shortage").unwrap());

// -------- Surge pricing --------
pub static SURGE_ACTIVE: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("surge_active", "1 if the boost is active").unwrap());

pub static SURGE_BONUS: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("surge_bonus_amount", "current per-delivery bonus").unwrap());

pub static SURGE_RATIO: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("surge_ratio", "pending orders per online driver").unwrap());

// ---- Config visibility ----
pub static CONFIG_STORE_MODE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("config_store_mode", "snapshot source (label: mode)"),
        &["mode"],
    )
    .unwrap()
});

pub static CONFIG_POLL_SECS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("config_poll_secs", "polling interval in seconds").unwrap());

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(FORECAST_RUNS.clone())),
        REGISTRY.register(Box::new(SNAPSHOT_ERRORS.clone())),
        REGISTRY.register(Box::new(COMPUTE_MS.clone())),
        REGISTRY.register(Box::new(SNAPSHOT_ORDERS.clone())),
        REGISTRY.register(Box::new(SNAPSHOT_PRODUCTS.clone())),
        REGISTRY.register(Box::new(PENDING_ORDERS.clone())),
        REGISTRY.register(Box::new(ACTIVE_DRIVERS.clone())),
        REGISTRY.register(Box::new(PREDICTED_TOTAL.clone())),
        REGISTRY.register(Box::new(PREDICTED_BY_HOUR.clone())),
        REGISTRY.register(Box::new(PEAK_HOUR.clone())),
        REGISTRY.register(Box::new(PEAK_COUNT.clone())),
        REGISTRY.register(Box::new(DRIVERS_NEEDED.clone())),
        REGISTRY.register(Box::new(TREND_COEFFICIENT.clone())),
        REGISTRY.register(Box::new(SAMPLE_SIZE.clone())),
        REGISTRY.register(Box::new(STOCK_RISKS.clone())),
        REGISTRY.register(Box::new(SURGE_ACTIVE.clone())),
        REGISTRY.register(Box::new(SURGE_BONUS.clone())),
        REGISTRY.register(Box::new(SURGE_RATIO.clone())),
        REGISTRY.register(Box::new(CONFIG_STORE_MODE.clone())),
        REGISTRY.register(Box::new(CONFIG_POLL_SECS.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

// Serve one HTTP request (GET / or /metrics) — tiny HTTP 1.1 responder
fn handle_client(mut stream: TcpStream) {
    // Read a bit to consume headers (no full parse)
    let mut _req_buf = [0u8; 1024];
    let _ = stream.read(&mut _req_buf);

    let body = encode_metrics();
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

// Run the metrics server in a dedicated OS thread (keeps Tokio runtime clean)
pub async fn serve_metrics(port: u16) {
    thread::spawn(move || {
        let addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&addr)
            .unwrap_or_else(|e| panic!("metrics bind {} failed: {}", addr, e));
        eprintln!("metrics listening on http://{addr}/ (and /metrics)");

        for conn in listener.incoming() {
            match conn {
                Ok(stream) => handle_client(stream),
                Err(e) => eprintln!("metrics accept error: {}", e),
            }
        }
    });
}
