//! Per-domain insight card generators.

use crate::aggregate::{mean, pct, value_counts};
use crate::models::{
    AsinTraffic, InsightCard, InventorySnapshot, Order, OrdersSummary, ReturnValueRow, Review,
    SettlementSummary, Severity, TrafficTotals,
};

use super::rules::{classify, Metric};
use super::spotlight;

/// Card for a classified metric.
fn rated(metric: Metric, value: f64, title: &str, message: String) -> InsightCard {
    InsightCard::new(classify(metric, value), title, message).with_value(value)
}

fn info(title: &str, message: String) -> InsightCard {
    InsightCard::new(Severity::Neutral, title, message)
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

pub fn inventory_insights(rows: &[InventorySnapshot]) -> Vec<InsightCard> {
    let mut cards = Vec::new();
    if rows.is_empty() {
        return cards;
    }
    let total_value: f64 = rows.iter().map(InventorySnapshot::stock_value).sum();
    let total_units: i64 = rows.iter().map(|r| r.available).sum();
    let velocities: Vec<f64> = rows.iter().filter_map(|r| r.velocity).collect();
    let avg_velocity = mean(&velocities);

    let cover = if avg_velocity > 0.0 {
        format!(
            "about {} months of cover",
            (total_units as f64 / avg_velocity / 30.0) as i64
        )
    } else {
        "no measurable sell-through".to_string()
    };
    cards.push(
        info(
            "Frozen capital",
            format!("${:.0} is tied up in stock, {}.", total_value, cover),
        )
        .with_value(total_value),
    );

    if let Some((top, share)) = spotlight::main_asset(rows) {
        cards.push(
            info(
                "Main asset",
                format!(
                    "{} holds ${:.0} ({:.0}% of stock value).",
                    top.sku,
                    top.stock_value(),
                    share
                ),
            )
            .with_value(share),
        );
    }

    let dead = spotlight::dead_stock(rows);
    if !dead.is_empty() {
        let dead_value: f64 = dead.iter().map(InventorySnapshot::stock_value).sum();
        cards.push(
            InsightCard::new(
                Severity::Bad,
                "Dead stock",
                format!(
                    "{} SKUs have no sales, holding ${:.0}. Consider liquidation.",
                    dead.len(),
                    dead_value
                ),
            )
            .with_value(dead.len() as f64),
        );
    }

    let days = if avg_velocity > 0.0 {
        (total_units as f64 / avg_velocity).trunc()
    } else {
        999.0
    };
    let message = match classify(Metric::StockCoverDays, days) {
        Severity::Bad => format!("Stock covers {} days. Out-of-stock risk.", days),
        Severity::Warn => format!("Stock covers {} days. Plan the next shipment.", days),
        _ => format!("Stock covers {} days.", days),
    };
    cards.push(rated(Metric::StockCoverDays, days, "Stock cover", message));
    cards
}

// ---------------------------------------------------------------------------
// Settlements
// ---------------------------------------------------------------------------

pub fn settlement_insights(s: &SettlementSummary) -> Vec<InsightCard> {
    vec![
        rated(
            Metric::NetMargin,
            s.margin_pct,
            "Net margin",
            format!("Net payout is {:.1}% of gross sales.", s.margin_pct),
        ),
        rated(
            Metric::FeeLoad,
            s.fee_pct,
            "Fee load",
            format!("Fees take {:.1}% of gross sales.", s.fee_pct),
        ),
        rated(
            Metric::RefundRate,
            s.refund_pct,
            "Refunds",
            format!("Refunds equal {:.1}% of gross sales.", s.refund_pct),
        ),
        info(
            "Bottom line",
            format!(
                "Sales ${:.0} turned into ${:.0} paid out. Fees: ${:.0}.",
                s.gross_sales,
                s.net_payout,
                s.fees.abs()
            ),
        )
        .with_value(s.net_payout),
    ]
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

pub fn return_insights(rows: &[ReturnValueRow], return_rate: f64) -> Vec<InsightCard> {
    let mut cards = vec![rated(
        Metric::ReturnRate,
        return_rate,
        "Return rate",
        format!("{:.1}% of orders came back.", return_rate),
    )];
    let total_value: f64 = rows.iter().map(|r| r.value).sum();
    cards.push(info("Damage", format!("Returns cost ${:.0}.", total_value)).with_value(total_value));

    let reasons = value_counts(
        rows.iter()
            .map(|r| r.record.reason.clone())
            .filter(|r| !r.is_empty()),
    );
    if let Some(top) = reasons.first() {
        cards.push(info("Top reason", format!("\"{}\" ({} returns).", top.key, top.count)));
    }
    if let Some(top) = value_counts(rows.iter().map(|r| r.record.sku.clone())).first() {
        cards.push(
            InsightCard::new(
                Severity::Bad,
                "Problem SKU",
                format!("{} ({} returns).", top.key, top.count),
            )
            .with_value(top.count as f64),
        );
    }
    cards
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

pub fn order_insights(summary: &OrdersSummary, orders: &[Order]) -> Vec<InsightCard> {
    let mut cards = vec![
        info(
            "Average order value",
            format!(
                "${:.2} per order. +10% AOV would add ${:.0}.",
                summary.avg_order_value,
                summary.revenue * 0.1
            ),
        )
        .with_value(summary.avg_order_value),
        info(
            "Daily revenue",
            format!(
                "${:.0} per day, ${:.0} projected over 30 days.",
                summary.revenue_per_day, summary.monthly_projection
            ),
        )
        .with_value(summary.revenue_per_day),
    ];
    if let Some((top, share)) = spotlight::top_revenue_sku(orders) {
        cards.push(
            InsightCard::new(
                Severity::Warn,
                "Concentration risk",
                format!("{} brings {:.0}% of revenue (${:.0}).", top.key, share, top.value),
            )
            .with_value(share),
        );
    }
    cards
}

// ---------------------------------------------------------------------------
// Traffic
// ---------------------------------------------------------------------------

pub fn traffic_insights(totals: &TrafficTotals, per_asin: &[AsinTraffic]) -> Vec<InsightCard> {
    let losing = spotlight::losing_buy_box(per_asin);
    let mut cards = vec![
        rated(
            Metric::Conversion,
            totals.conversion_pct,
            "Conversion",
            format!("{:.1}% of sessions convert.", totals.conversion_pct),
        ),
        rated(
            Metric::BuyBox,
            totals.buy_box_pct,
            "Buy Box",
            format!(
                "Average Buy Box {:.1}%; {} ASINs below 80%.",
                totals.buy_box_pct,
                losing.len()
            ),
        ),
        rated(
            Metric::MobileSharePct,
            totals.mobile_share_pct,
            "Mobile",
            format!("{:.0}% of sessions are mobile.", totals.mobile_share_pct),
        ),
    ];

    let low = spotlight::low_conversion_asins(per_asin);
    cards.push(match low.first() {
        Some(worst) => InsightCard::new(
            Severity::Bad,
            "Missed revenue",
            format!(
                "{} high-traffic ASINs convert below the median. Worst: {}.",
                low.len(),
                worst.asin
            ),
        )
        .with_value(low.len() as f64),
        None => InsightCard::new(
            Severity::Good,
            "Missed revenue",
            "High-traffic ASINs all convert well.",
        ),
    });

    cards.push(
        info(
            "Session value",
            format!(
                "Each session brings ${:.2}; 1000 more would add ${:.0}.",
                totals.revenue_per_session,
                totals.revenue_per_session * 1000.0
            ),
        )
        .with_value(totals.revenue_per_session),
    );

    if let Some((top, share)) = spotlight::top_revenue_asin(per_asin, totals.revenue) {
        cards.push(
            info(
                "Top ASIN",
                format!("{} = ${:.0} ({:.0}% of revenue).", top.asin, top.revenue, share),
            )
            .with_value(share),
        );
    }
    cards
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

/// Review cards. The most-negative ASIN card only appears without an ASIN filter.
pub fn review_insights(reviews: &[Review], asin: Option<&str>) -> Vec<InsightCard> {
    let total = reviews.len() as f64;
    if reviews.is_empty() {
        return Vec::new();
    }
    let avg = reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / total;
    let negative = reviews.iter().filter(|r| r.is_negative()).count() as f64;
    let positive = reviews.iter().filter(|r| r.is_positive()).count() as f64;
    let verified = reviews.iter().filter(|r| r.is_verified).count() as f64;
    let neg_pct = pct(negative, total);
    let pos_pct = pct(positive, total);
    let ver_pct = pct(verified, total);

    let mut cards = vec![
        rated(
            Metric::AvgRating,
            avg,
            "Rating health",
            format!("Average rating {:.1} stars.", avg),
        ),
        rated(
            Metric::NegativeReviewPct,
            neg_pct,
            "Negative share",
            format!("{:.1}% of reviews are 1-2 stars.", neg_pct),
        ),
        rated(
            Metric::PositiveReviewPct,
            pos_pct,
            "Loyalty",
            format!("{:.1}% of reviews are 4-5 stars.", pos_pct),
        ),
        rated(
            Metric::VerifiedReviewPct,
            ver_pct,
            "Verification",
            format!("{:.1}% of reviews are verified purchases.", ver_pct),
        ),
    ];
    if asin.is_none() {
        if let Some((worst, count)) = spotlight::most_negative_asin(reviews) {
            cards.push(
                InsightCard::new(
                    Severity::Bad,
                    "Most negative ASIN",
                    format!("{} has {} negative reviews. Start here.", worst, count),
                )
                .with_value(count as f64),
            );
        }
    }
    cards
}

