//! Metrics that combine returns with orders.

use std::collections::{HashMap, HashSet};

use crate::aggregate::pct;
use crate::models::{Order, ReturnRecord, ReturnValueRow};

/// Distinct returned order ids over distinct order ids, as a percentage.
///
/// Both slices should cover the same period. Returns 0 when `orders` is
/// empty, whatever `returns` holds.
pub fn return_rate(returns: &[ReturnRecord], orders: &[Order]) -> f64 {
    let ordered: HashSet<&str> = orders
        .iter()
        .map(|o| o.order_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    if ordered.is_empty() {
        return 0.0;
    }
    let returned: HashSet<&str> = returns
        .iter()
        .map(|r| r.order_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    pct(returned.len() as f64, ordered.len() as f64)
}

/// Mean `item_price` per SKU.
pub fn avg_price_by_sku(orders: &[Order]) -> HashMap<String, f64> {
    let mut acc: HashMap<&str, (f64, usize)> = HashMap::new();
    for o in orders {
        let entry = acc.entry(o.sku.as_str()).or_insert((0.0, 0));
        entry.0 += o.item_price;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(sku, (total, n))| (sku.to_string(), total / n as f64))
        .collect()
}

/// Attach a unit price and a value to every return.
///
/// A return without its own price takes the mean order price of its SKU, or
/// 0 when the SKU was never ordered. Every return row is kept.
pub fn return_value(returns: &[ReturnRecord], orders: &[Order]) -> Vec<ReturnValueRow> {
    let needs_lookup = returns.iter().any(|r| r.price.is_none());
    let prices = if needs_lookup {
        avg_price_by_sku(orders)
    } else {
        HashMap::new()
    };
    returns
        .iter()
        .map(|r| {
            let unit_price = r
                .price
                .or_else(|| prices.get(&r.sku).copied())
                .unwrap_or(0.0);
            ReturnValueRow {
                record: r.clone(),
                unit_price,
                value: unit_price * r.quantity as f64,
            }
        })
        .collect()
}
