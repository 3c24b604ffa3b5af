// ===============================
// src/snapshot.rs
// ===============================
//
// Snapshot adapters:
// - mock_snapshot : synthetic order/product history (no storefront needed)
// - StoreClient   : read-only REST client for the storefront API
//
// The store serves loosely-typed documents; each one is validated into
// an OrderRecord/ProductRecord here and skipped (with a warn) when it
// misses required fields. The core never sees a malformed record.
//
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::calendar::{self, NIGHT_HOURS};
use crate::domain::{OpsSnapshot, OrderRecord, OrderStatus, ProductRecord};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
}

// ---------- Mock feed ----------

const MOCK_CATALOG: [(&str, f64, u32); 6] = [
    ("Vodka Absolut 70cl", 18.50, 8),
    ("Jack Daniel's 70cl", 24.90, 6),
    ("Red Bull 25cl", 2.50, 24),
    ("Coca-Cola 1.5L", 3.20, 18),
    ("Chips Paprika", 2.80, 10),
    ("Glacons 2kg", 3.50, 12),
];

/// Synthetic history: a few orders per night hour for every night of the
/// lookback window, plus randomized live dispatch counts.
pub fn mock_snapshot(now: DateTime<Utc>, lookback_days: i64, utc_offset_hours: i32) -> OpsSnapshot {
    let offset = calendar::fixed_offset(utc_offset_hours);
    let mut rng = rand::thread_rng();
    let mut orders = Vec::new();

    for day in 1..=lookback_days {
        let date = calendar::local_date(now - Duration::days(day), offset);
        for &hour in NIGHT_HOURS.iter() {
            for _ in 0..rng.gen_range(0..=3u32) {
                let Some(naive) = date.and_hms_opt(hour, rng.gen_range(0..60), 0) else {
                    continue;
                };
                let Some(local) = naive.and_local_timezone(offset).single() else {
                    continue;
                };
                let (items, total) = mock_items(&mut rng);
                let status = if rng.gen_range(0..10) == 0 {
                    OrderStatus::Cancelled
                } else {
                    OrderStatus::Delivered
                };
                orders.push(OrderRecord {
                    id: format!("mock-{day}-{hour}-{}", rng.gen::<u32>()),
                    created_at: Some(local.with_timezone(&Utc)),
                    status,
                    items,
                    total,
                });
            }
        }
    }

    let products = MOCK_CATALOG
        .iter()
        .enumerate()
        .map(|(i, (name, _, stock))| ProductRecord {
            id: format!("prod-{i}"),
            name: (*name).to_string(),
            stock: rng.gen_range(0..=*stock),
        })
        .collect();

    OpsSnapshot {
        orders,
        products,
        pending_orders: rng.gen_range(0..12),
        active_drivers: rng.gen_range(0..6),
    }
}

fn mock_items(rng: &mut impl Rng) -> (String, f64) {
    let mut lines = Vec::new();
    let mut total = 0.0;
    for _ in 0..rng.gen_range(1..=3u32) {
        let (name, price, _) = MOCK_CATALOG[rng.gen_range(0..MOCK_CATALOG.len())];
        let qty = rng.gen_range(1..=3u32);
        // The storefront mixes both human quantity styles.
        if rng.gen_bool(0.5) {
            lines.push(format!("{qty}x {name}"));
        } else {
            lines.push(format!("{name} x{qty}"));
        }
        total += price * qty as f64;
    }
    (lines.join("\n"), total)
}

// ---------- Storefront REST client ----------

pub struct StoreClient {
    http: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DispatchDoc {
    #[serde(default)]
    pending_orders: u32,
    #[serde(default)]
    active_drivers: u32,
}

impl StoreClient {
    pub fn new(base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// One full snapshot: bounded order history, catalog, live dispatch counts.
    pub async fn fetch_snapshot(
        &self,
        now: DateTime<Utc>,
        lookback_days: i64,
    ) -> Result<OpsSnapshot, SnapshotError> {
        // "Z" suffix keeps the query string free of '+' characters.
        let since =
            (now - Duration::days(lookback_days)).to_rfc3339_opts(SecondsFormat::Secs, true);
        let orders_url = format!("{}/api/orders?since={}", self.base, since);
        let products_url = format!("{}/api/products", self.base);
        let dispatch_url = format!("{}/api/dispatch/live", self.base);

        let order_docs: Vec<serde_json::Value> = self.get_json(&orders_url).await?;
        let product_docs: Vec<serde_json::Value> = self.get_json(&products_url).await?;
        let dispatch: DispatchDoc = self.get_json(&dispatch_url).await?;

        Ok(OpsSnapshot {
            orders: decode_docs(order_docs, "order"),
            products: decode_docs(product_docs, "product"),
            pending_orders: dispatch.pending_orders,
            active_drivers: dispatch.active_drivers,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, SnapshotError> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.json::<T>().await?)
    }
}

/// Validate loosely-typed store documents one by one; a bad document is
/// skipped, never fatal for the whole snapshot.
fn decode_docs<T: serde::de::DeserializeOwned>(
    docs: Vec<serde_json::Value>,
    kind: &'static str,
) -> Vec<T> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        match serde_json::from_value::<T>(doc) {
            Ok(rec) => out.push(rec),
            Err(e) => warn!(%kind, error = %e, "skipping malformed store document"),
        }
    }
    out
}
