// ===============================
// src/domain.rs
// ===============================
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status as stored by the storefront. The engine only
/// cares about one distinction: cancelled vs everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum OrderStatus {
    Pending,
    Assigned,
    Delivering,
    Delivered,
    Cancelled,
    /// Unknown status strings coming out of the document store.
    /// Treated as active so a new lifecycle state never hides demand.
    Other,
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "assigned" => OrderStatus::Assigned,
            "delivering" => OrderStatus::Delivering,
            "delivered" => OrderStatus::Delivered,
            // The store has used both spellings over time.
            "cancelled" | "canceled" | "annulee" => OrderStatus::Cancelled,
            _ => OrderStatus::Other,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

/// Raw order document as fetched from the store. `created_at` is optional:
/// documents missing it are excluded from every time-windowed computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: OrderStatus,
    /// Freeform multi-line text, one line per product ("2x Vodka (18.50)").
    #[serde(default)]
    pub items: String,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stock: u32,
}

/// One parsed line of an order's items text. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLineItem {
    pub name: String,
    /// Always >= 1.
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPrediction {
    /// Local hour, 0..=23.
    pub hour: u32,
    /// Display label ("20h", "0h", ...).
    pub label: String,
    pub predicted_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRisk {
    pub product_id: String,
    pub name: String,
    pub current_stock: u32,
    pub predicted_need: u32,
    /// predicted_need - current_stock; only positive values are emitted.
    pub deficit: u32,
}

/// Sole output of the forecaster. Built fresh on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    /// One entry per night hour, in chronological night order (20h..6h).
    pub hourly: Vec<HourlyPrediction>,
    pub total_tonight: u32,
    pub peak_hour: u32,
    pub peak_count: u32,
    pub drivers_needed: u32,
    /// Worst shortage first.
    pub stock_risks: Vec<StockRisk>,
    /// Bounded to [0.85, 1.35].
    pub trend_coefficient: f64,
    /// round((coefficient - 1) * 100), display only.
    pub trend_percent: i32,
    /// Orders that survived the 3-night filter.
    pub sample_size: usize,
    /// The reference nights the history was read from, nearest first.
    pub reference_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurgeResult {
    pub is_active: bool,
    pub bonus_amount: f64,
    pub ratio: f64,
    pub pending_orders: u32,
    pub active_drivers: u32,
    pub reason: String,
    pub computed_at: DateTime<Utc>,
}

/// One snapshot of everything the engine reads, fetched by the polling loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpsSnapshot {
    pub orders: Vec<OrderRecord>,
    pub products: Vec<ProductRecord>,
    /// Orders awaiting driver assignment right now.
    pub pending_orders: u32,
    /// Drivers currently online.
    pub active_drivers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Forecast(ForecastResult),
    Surge(SurgeResult),
}
