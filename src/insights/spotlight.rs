//! Best/worst entity selection with a minimum sample size.
//!
//! Entities below the minimum are left out of the comparison entirely.
//! On equal scores the entity seen first wins.

use crate::aggregate::{median, pct, top_n, value_counts, AggRow, GroupBy};
use crate::models::{AsinTraffic, InventorySnapshot, KeyedValue, Order, Review, ReviewStats, Spotlight};

/// Minimum reviews for an ASIN or marketplace to be ranked.
pub const MIN_REVIEWS: usize = 5;
/// Minimum reviews for an ASIN ranked inside a single marketplace, or a variant.
pub const MIN_REVIEWS_NESTED: usize = 3;

/// Review statistics per key, in first-seen key order.
pub fn review_stats_by<F>(reviews: &[Review], key: F) -> Vec<ReviewStats>
where
    F: Fn(&Review) -> String,
{
    GroupBy::new(reviews, key)
        .count("reviews")
        .mean("rating", |r| f64::from(r.rating))
        .count_where("negative", Review::is_negative)
        .count_where("positive", Review::is_positive)
        .finish()
        .into_iter()
        .map(|row| {
            let n = row.get("reviews");
            ReviewStats {
                key: row.key.clone(),
                reviews: n as usize,
                avg_rating: row.get("rating"),
                negative: row.get("negative") as usize,
                positive: row.get("positive") as usize,
                negative_pct: pct(row.get("negative"), n),
                positive_pct: pct(row.get("positive"), n),
            }
        })
        .collect()
}

fn pick<F>(stats: &[ReviewStats], min_reviews: usize, score: F) -> Option<ReviewStats>
where
    F: Fn(&ReviewStats) -> f64,
{
    let mut best: Option<&ReviewStats> = None;
    for s in stats.iter().filter(|s| s.reviews >= min_reviews) {
        match best {
            Some(b) if score(s) <= score(b) => {}
            _ => best = Some(s),
        }
    }
    best.cloned()
}

/// Highest negative share among entities with at least `min_reviews`.
pub fn worst_by_negative(stats: &[ReviewStats], min_reviews: usize) -> Option<ReviewStats> {
    pick(stats, min_reviews, |s| s.negative_pct)
}

/// Highest mean rating among entities with at least `min_reviews`.
pub fn best_by_rating(stats: &[ReviewStats], min_reviews: usize) -> Option<ReviewStats> {
    pick(stats, min_reviews, |s| s.avg_rating)
}

/// Marketplace with the most reviews for `asin`.
pub fn main_marketplace_of(reviews: &[Review], asin: &str) -> Option<String> {
    value_counts(reviews.iter().filter(|r| r.asin == asin).map(|r| r.domain.clone()))
        .into_iter()
        .next()
        .map(|c| c.key)
}

fn asin_stats_in(reviews: &[Review], domain: &str) -> Vec<ReviewStats> {
    let subset: Vec<Review> = reviews.iter().filter(|r| r.domain == domain).cloned().collect();
    review_stats_by(&subset, |r| r.asin.clone())
}

pub fn worst_asin(reviews: &[Review]) -> Option<Spotlight> {
    let stats = review_stats_by(reviews, |r| r.asin.clone());
    worst_by_negative(&stats, MIN_REVIEWS).map(|s| Spotlight {
        key: s.key.clone(),
        main_counterpart: main_marketplace_of(reviews, &s.key),
        stats: s,
    })
}

pub fn best_asin(reviews: &[Review]) -> Option<Spotlight> {
    let stats = review_stats_by(reviews, |r| r.asin.clone());
    best_by_rating(&stats, MIN_REVIEWS).map(|s| Spotlight {
        key: s.key.clone(),
        main_counterpart: main_marketplace_of(reviews, &s.key),
        stats: s,
    })
}

/// Worst marketplace, paired with its worst ASIN.
pub fn worst_marketplace(reviews: &[Review]) -> Option<Spotlight> {
    let stats = review_stats_by(reviews, |r| r.domain.clone());
    worst_by_negative(&stats, MIN_REVIEWS).map(|s| {
        let inner = asin_stats_in(reviews, &s.key);
        Spotlight {
            key: s.key.clone(),
            main_counterpart: worst_by_negative(&inner, MIN_REVIEWS_NESTED).map(|a| a.key),
            stats: s,
        }
    })
}

/// Best marketplace, paired with its best ASIN.
pub fn best_marketplace(reviews: &[Review]) -> Option<Spotlight> {
    let stats = review_stats_by(reviews, |r| r.domain.clone());
    best_by_rating(&stats, MIN_REVIEWS).map(|s| {
        let inner = asin_stats_in(reviews, &s.key);
        Spotlight {
            key: s.key.clone(),
            main_counterpart: best_by_rating(&inner, MIN_REVIEWS_NESTED).map(|a| a.key),
            stats: s,
        }
    })
}

/// ASIN with the most negative reviews overall, no minimum sample.
pub fn most_negative_asin(reviews: &[Review]) -> Option<(String, usize)> {
    value_counts(reviews.iter().filter(|r| r.is_negative()).map(|r| r.asin.clone()))
        .into_iter()
        .next()
        .map(|c| (c.key, c.count))
}

// ---------------------------------------------------------------------------
// Sales-side spotlights
// ---------------------------------------------------------------------------

/// SKU with the largest share of order revenue, with that share in percent.
pub fn top_revenue_sku(orders: &[Order]) -> Option<(KeyedValue, f64)> {
    let total: f64 = orders.iter().map(Order::line_total).sum();
    let rows = GroupBy::new(orders, |o| o.sku.clone())
        .sum("revenue", Order::line_total)
        .finish();
    let mut best: Option<&AggRow> = None;
    for r in &rows {
        match best {
            Some(b) if r.get("revenue") <= b.get("revenue") => {}
            _ => best = Some(r),
        }
    }
    best.map(|b| {
        let value = b.get("revenue");
        (
            KeyedValue {
                key: b.key.clone(),
                value,
            },
            pct(value, total),
        )
    })
}

/// SKUs that report a velocity of exactly zero.
pub fn dead_stock(rows: &[InventorySnapshot]) -> Vec<InventorySnapshot> {
    rows.iter().filter(|r| r.is_dead_stock()).cloned().collect()
}

/// SKU holding the most stock value, with its share of the total in percent.
pub fn main_asset(rows: &[InventorySnapshot]) -> Option<(InventorySnapshot, f64)> {
    let total: f64 = rows.iter().map(InventorySnapshot::stock_value).sum();
    let mut best: Option<&InventorySnapshot> = None;
    for r in rows {
        match best {
            Some(b) if r.stock_value() <= b.stock_value() => {}
            _ => best = Some(r),
        }
    }
    best.map(|b| (b.clone(), pct(b.stock_value(), total)))
}

/// ASINs with above-median sessions and below-median conversion,
/// highest sessions first.
pub fn low_conversion_asins(stats: &[AsinTraffic]) -> Vec<AsinTraffic> {
    let sessions: Vec<f64> = stats.iter().map(|s| s.sessions as f64).collect();
    let conversions: Vec<f64> = stats.iter().map(|s| s.conversion_pct).collect();
    let median_sessions = median(&sessions);
    let median_conversion = median(&conversions);
    let flagged: Vec<AsinTraffic> = stats
        .iter()
        .filter(|s| s.sessions as f64 > median_sessions && s.conversion_pct < median_conversion)
        .cloned()
        .collect();
    top_n(&flagged, flagged.len(), |s| s.sessions as f64)
}

/// ASINs whose buy box share is under 80%.
pub fn losing_buy_box(stats: &[AsinTraffic]) -> Vec<AsinTraffic> {
    stats
        .iter()
        .filter(|s| s.buy_box_pct < 80.0)
        .cloned()
        .collect()
}

/// ASIN with the most revenue, with its share of `total_revenue` in percent.
pub fn top_revenue_asin(stats: &[AsinTraffic], total_revenue: f64) -> Option<(AsinTraffic, f64)> {
    let mut best: Option<&AsinTraffic> = None;
    for s in stats {
        match best {
            Some(b) if s.revenue <= b.revenue => {}
            _ => best = Some(s),
        }
    }
    best.map(|b| (b.clone(), pct(b.revenue, total_revenue)))
}
