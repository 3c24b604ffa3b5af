// ===============================
// src/stock.rs
// ===============================
//
// Cross-references parsed historical sales against current catalog stock.
// Product names and freeform order text rarely match exactly, so the join
// is a deliberately loose bidirectional substring test. It can over-count
// when one product name sits inside several sale keys and under-count
// when naming conventions diverge; it is a best-effort heuristic, not an
// exact join.
//
use ahash::AHashMap as HashMap;
use chrono::{FixedOffset, NaiveDate};

use crate::calendar;
use crate::domain::{OrderRecord, ProductRecord, StockRisk};
use crate::lineitem;

/// Flag products whose predicted nightly need exceeds current stock.
/// Reads the same reference-night order set as the hourly aggregation,
/// sorted worst shortage first.
pub fn analyze_stock_risks(
    orders: &[OrderRecord],
    products: &[ProductRecord],
    dates: &[NaiveDate],
    offset: FixedOffset,
    coefficient: f64,
    nights: f64,
) -> Vec<StockRisk> {
    let sales = night_sales(orders, dates, offset);

    let mut risks = Vec::new();
    for product in products {
        let key = product.name.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        // Sum every matching sale key, not just the first.
        let sold: u32 = sales
            .iter()
            .filter(|(sale_key, _)| names_match(&key, sale_key.as_str()))
            .map(|(_, qty)| *qty)
            .sum();
        let predicted_need = ((sold as f64 / nights) * coefficient).ceil() as u32;
        if predicted_need == 0 || predicted_need <= product.stock {
            continue;
        }
        risks.push(StockRisk {
            product_id: product.id.clone(),
            name: product.name.clone(),
            current_stock: product.stock,
            predicted_need,
            deficit: predicted_need - product.stock,
        });
    }
    risks.sort_by(|a, b| b.deficit.cmp(&a.deficit));
    risks
}

/// Summed quantity per normalized parsed name over the reference nights.
fn night_sales(
    orders: &[OrderRecord],
    dates: &[NaiveDate],
    offset: FixedOffset,
) -> HashMap<String, u32> {
    let mut sales: HashMap<String, u32> = HashMap::new();
    for order in orders {
        if order.status.is_cancelled() {
            continue;
        }
        let Some(created_at) = order.created_at else {
            continue;
        };
        if !calendar::is_night_hour(calendar::local_hour(created_at, offset))
            || !dates.contains(&calendar::local_date(created_at, offset))
        {
            continue;
        }
        for item in lineitem::parse_items(&order.items) {
            *sales.entry(item.name.to_lowercase()).or_insert(0) += item.quantity;
        }
    }
    sales
}

fn names_match(product_key: &str, sale_key: &str) -> bool {
    product_key.contains(sale_key) || sale_key.contains(product_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::fixed_offset;
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

    fn product(id: &str, name: &str, stock: u32) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: name.to_string(),
            stock,
        }
    }

    // 2025-03-08, a reference Saturday; 23:15Z is 20:15 local.
    const NIGHT_TS: &str = "2025-03-08T23:15:00Z";

    fn ref_dates() -> Vec<NaiveDate> {
        vec![
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 22).unwrap(),
        ]
    }

    #[test]
    fn short_product_is_flagged_with_its_deficit() {
        // 9 vodkas over three nights, 2 in stock: need ceil(9/3) = 3, deficit 1.
        let off = fixed_offset(-3);
        let orders = vec![
            order("a", NIGHT_TS, "3x Vodka"),
            order("b", NIGHT_TS, "Vodka x3"),
            order("c", NIGHT_TS, "3x Vodka"),
        ];
        let products = vec![product("p1", "Vodka Absolut 70cl", 2)];

        let risks = analyze_stock_risks(&orders, &products, &ref_dates(), off, 1.0, 3.0);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].predicted_need, 3);
        assert_eq!(risks[0].deficit, 1);
        assert_eq!(risks[0].current_stock, 2);
    }

    #[test]
    fn containment_matches_both_directions_and_sums() {
        let off = fixed_offset(-3);
        // Sale keys: "vodka" and "vodka absolut 70cl premium"; the product
        // name contains one and is contained by the other.
        let orders = vec![
            order("a", NIGHT_TS, "6x Vodka"),
            order("b", NIGHT_TS, "3x Vodka Absolut 70cl premium"),
        ];
        let products = vec![product("p1", "Vodka Absolut 70cl", 0)];

        let risks = analyze_stock_risks(&orders, &products, &ref_dates(), off, 1.0, 3.0);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].predicted_need, 3); // ceil((6 + 3) / 3)
    }

    #[test]
    fn covered_stock_and_unsold_products_are_silent() {
        let off = fixed_offset(-3);
        let orders = vec![order("a", NIGHT_TS, "3x Vodka")];
        let products = vec![
            product("p1", "Vodka", 5),    // need 1 <= stock
            product("p2", "Tequila", 0),  // never sold
            product("p3", "", 0),         // nameless catalog noise
        ];
        let risks = analyze_stock_risks(&orders, &products, &ref_dates(), off, 1.0, 3.0);
        assert!(risks.is_empty());
    }

    #[test]
    fn cancelled_and_off_night_orders_sell_nothing() {
        let off = fixed_offset(-3);
        let mut cancelled = order("a", NIGHT_TS, "9x Vodka");
        cancelled.status = OrderStatus::Cancelled;
        let daytime = order("b", "2025-03-08T15:00:00Z", "9x Vodka");
        let products = vec![product("p1", "Vodka", 0)];
        let risks =
            analyze_stock_risks(&[cancelled, daytime], &products, &ref_dates(), off, 1.0, 3.0);
        assert!(risks.is_empty());
    }

    #[test]
    fn unknown_status_orders_still_sell() {
        let off = fixed_offset(-3);
        let mut unknown = order("a", NIGHT_TS, "3x Vodka");
        unknown.status = OrderStatus::Other;
        let products = vec![product("p1", "Vodka", 0)];
        let risks = analyze_stock_risks(&[unknown], &products, &ref_dates(), off, 1.0, 3.0);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].deficit, 1);
    }

    #[test]
    fn worst_shortage_sorts_first() {
        let off = fixed_offset(-3);
        let orders = vec![order("a", NIGHT_TS, "3x Chips\n15x Red Bull")];
        let products = vec![
            product("p1", "Chips", 0),    // need 1, deficit 1
            product("p2", "Red Bull", 0), // need 5, deficit 5
        ];
        let risks = analyze_stock_risks(&orders, &products, &ref_dates(), off, 1.0, 3.0);
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].name, "Red Bull");
        assert_eq!(risks[0].deficit, 5);
        assert_eq!(risks[1].deficit, 1);
    }

    #[test]
    fn trend_scales_the_predicted_need() {
        let off = fixed_offset(-3);
        let orders = vec![order("a", NIGHT_TS, "9x Vodka")];
        let products = vec![product("p1", "Vodka", 3)];
        // ceil(9/3 * 1.3) = ceil(3.9) = 4 > 3.
        let risks = analyze_stock_risks(&orders, &products, &ref_dates(), off, 1.3, 3.0);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].predicted_need, 4);
        assert_eq!(risks[0].deficit, 1);
    }
}
