//! Report computations against the in-memory sample store.

mod common;

use common::day;
use fba_insights::models::{DateRange, Severity};
use fba_insights::{ReportParams, Section};

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn whole_year() -> DateRange {
    DateRange::new(day("2024-01-01"), day("2024-12-31"))
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[test]
fn inventory_summary_uses_newest_day() {
    let fba = common::setup_sample_fba();
    let s = fba.inventory().summary(&ReportParams::new());
    assert_eq!(s.as_of, Some(day("2024-03-03")));
    assert_eq!(s.sku_count, 3);
    assert_eq!(s.total_units, 110);
    approx(s.total_value, 1500.0);
    approx(s.velocity_30d_units, 180.0);
    approx(s.avg_price, 35.0 / 3.0);
}

#[test]
fn inventory_delta_against_previous_snapshot_day() {
    let fba = common::setup_sample_fba();
    let s = fba.inventory().summary(&ReportParams::new());
    let prev = s.previous.unwrap();
    assert_eq!(prev.as_of, day("2024-03-02"));
    assert_eq!(prev.units_delta, 30);
    approx(prev.value_delta, 700.0);
    assert_eq!(prev.sku_count_delta, 2);
}

#[test]
fn inventory_as_of_picks_latest_per_sku() {
    let fba = common::setup_sample_fba();
    let params = ReportParams::new().as_of(day("2024-03-02"));
    let current = fba.inventory().current(&params);
    assert_eq!(current.len(), 2);
    let s = fba.inventory().summary(&params);
    assert_eq!(s.total_units, 130);
    assert_eq!(s.previous.unwrap().units_delta, -10);
}

#[test]
fn inventory_as_of_on_gap_day_compares_with_earlier_snapshot() {
    let fba = common::setup_sample_fba();
    // No snapshot on 2024-03-04; the 2024-03-03 rows are current
    let s = fba
        .inventory()
        .summary(&ReportParams::new().as_of(day("2024-03-04")));
    assert_eq!(s.as_of, Some(day("2024-03-03")));
    assert_eq!(s.total_units, 110);
    let prev = s.previous.unwrap();
    assert_eq!(prev.as_of, day("2024-03-02"));
    assert_eq!(prev.units_delta, 30);
}

#[test]
fn inventory_store_filter() {
    let fba = common::setup_sample_fba();
    let s = fba.inventory().summary(&ReportParams::new().store("EU"));
    assert_eq!(s.sku_count, 0);
    assert_eq!(s.as_of, None);
    assert!(s.previous.is_none());
}

#[test]
fn inventory_value_report_rankings() {
    let fba = common::setup_sample_fba();
    let report = fba.inventory().value_report(&ReportParams::new());
    let by_value: Vec<&str> = report.top_by_value.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(by_value, vec!["SKU-B", "SKU-A", "SKU-C"]);
    assert_eq!(report.top_by_available[0].sku, "SKU-A");
    assert_eq!(report.value_by_store.len(), 1);
    approx(report.value_by_store[0].value, 1500.0);
}

#[test]
fn inventory_insight_cards() {
    let fba = common::setup_sample_fba();
    let report = fba.inventory().value_report(&ReportParams::new());
    let dead = report
        .insights
        .iter()
        .find(|c| c.title == "Dead stock")
        .unwrap();
    assert_eq!(dead.metric_value, Some(1.0));
    let cover = report
        .insights
        .iter()
        .find(|c| c.title == "Stock cover")
        .unwrap();
    // 110 units at a mean velocity of 2 per day
    assert_eq!(cover.metric_value, Some(55.0));
    assert_eq!(cover.severity, Severity::Warn);
}

#[test]
fn aging_report_buckets_and_velocity() {
    let fba = common::setup_sample_fba();
    let report = fba.inventory().aging_report(&ReportParams::new());
    let buckets: Vec<(&str, f64)> = report
        .buckets
        .iter()
        .map(|b| (b.bucket.as_str(), b.units))
        .collect();
    assert_eq!(buckets, vec![("Upto 90 Days", 60.0), ("91 to 180 Days", 50.0)]);
    // SKU-C has no stock and is left out
    assert_eq!(report.velocity.len(), 2);
}

#[test]
fn inventory_table_lists_dates() {
    let fba = common::setup_sample_fba();
    let table = fba.inventory().table(&ReportParams::new());
    assert_eq!(
        table.dates,
        vec![day("2024-03-03"), day("2024-03-02"), day("2024-03-01")]
    );
    assert_eq!(table.rows.len(), 3);
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[test]
fn orders_default_to_last_week() {
    let fba = common::setup_sample_fba();
    let report = fba.orders().report(&ReportParams::new());
    assert_eq!(
        report.range,
        Some(DateRange::new(day("2024-02-27"), day("2024-03-05")))
    );
    assert_eq!(report.summary.order_count, 3);
    assert_eq!(report.summary.items, 4);
    approx(report.summary.revenue, 50.0);
    approx(
        report.summary.monthly_projection,
        report.summary.revenue_per_day * 30.0,
    );
}

#[test]
fn orders_rank_skus_and_statuses() {
    let fba = common::setup_sample_fba();
    let report = fba.orders().report(&ReportParams::new());
    assert_eq!(report.top_skus[0].key, "SKU-A");
    approx(report.top_skus[0].value, 30.0);
    assert_eq!(report.status_counts[0].key, "Shipped");
    assert_eq!(report.status_counts[0].count, 2);
    assert_eq!(report.daily_revenue.len(), 3);
    assert!(report
        .insights
        .iter()
        .any(|c| c.title == "Concentration risk"));
}

#[test]
fn orders_store_and_range_filters() {
    let fba = common::setup_sample_fba();
    let us = fba.orders().report(&ReportParams::new().store("US"));
    approx(us.summary.revenue, 40.0);
    let all = fba.orders().report(&ReportParams::new().range(whole_year()));
    assert_eq!(all.summary.order_count, 4);
    approx(all.summary.revenue, 66.0);
    assert_eq!(fba.orders().list(None).len(), 4);
}

#[test]
fn orders_without_id_are_not_counted_as_orders() {
    use fba_insights::reports::orders::summarize;
    let orders = vec![
        common::order("O-1", "SKU-A", "2024-03-01 10:00:00", 1, 10.0),
        common::order("", "SKU-A", "2024-03-01 11:00:00", 2, 10.0),
        common::order("O-1", "SKU-B", "2024-03-02 10:00:00", 1, 5.0),
    ];
    let s = summarize(&orders);
    assert_eq!(s.order_count, 1);
    assert_eq!(s.items, 4);
}

// ---------------------------------------------------------------------------
// Settlements
// ---------------------------------------------------------------------------

#[test]
fn settlements_usd_scenario() {
    let fba = common::setup_sample_fba();
    let report = fba
        .settlements()
        .report(&ReportParams::new().currency("USD"));
    let s = &report.summary;
    approx(s.net_payout, 70.0);
    approx(s.gross_sales, 100.0);
    approx(s.refunds, -20.0);
    approx(s.fees, -10.0);
    approx(s.margin_pct, 70.0);
    approx(s.fee_pct, 10.0);
    approx(s.refund_pct, 20.0);
    assert_eq!(report.insights[0].severity, Severity::Good);
}

#[test]
fn settlements_cost_breakdown_and_trend() {
    let fba = common::setup_sample_fba();
    let report = fba
        .settlements()
        .report(&ReportParams::new().currency("USD"));
    let costs: Vec<(&str, f64)> = report
        .cost_breakdown
        .iter()
        .map(|k| (k.key.as_str(), k.value))
        .collect();
    assert_eq!(costs, vec![("Refund", 20.0), ("FBA Fee", 10.0)]);
    assert_eq!(report.payout_trend.len(), 2);
    approx(report.payout_trend[1].value, -30.0);
    assert_eq!(report.recent[0].posted_date, common::at("2024-03-02 11:00:00"));
}

#[test]
fn settlements_list_currencies() {
    let fba = common::setup_sample_fba();
    assert_eq!(fba.settlements().currencies(), vec!["EUR", "USD"]);
    let report = fba.settlements().report(&ReportParams::new());
    assert_eq!(report.summary.transaction_count, 4);
    approx(report.summary.net_payout, 120.0);
}

// ---------------------------------------------------------------------------
// Traffic
// ---------------------------------------------------------------------------

#[test]
fn traffic_totals() {
    let fba = common::setup_sample_fba();
    let report = fba.traffic().report(&ReportParams::new());
    let t = &report.totals;
    assert_eq!(t.sessions, 400);
    assert_eq!(t.units, 35);
    approx(t.revenue, 700.0);
    approx(t.conversion_pct, 8.75);
    approx(t.buy_box_pct, 85.0);
    approx(t.mobile_share_pct, 57.5);
    approx(t.revenue_per_session, 1.75);
}

#[test]
fn traffic_per_asin_and_daily() {
    let fba = common::setup_sample_fba();
    let report = fba.traffic().report(&ReportParams::new());
    let top = &report.top_by_revenue[0];
    assert_eq!(top.asin, "ASIN-1");
    assert_eq!(top.sessions, 300);
    approx(top.buy_box_pct, 97.5);
    approx(top.conversion_pct, 10.0);
    assert_eq!(report.daily.len(), 2);
    assert_eq!(report.daily[0].sessions, 200);
    approx(report.daily[0].conversion_pct, 7.5);
}

#[test]
fn traffic_cards() {
    let fba = common::setup_sample_fba();
    let report = fba.traffic().report(&ReportParams::new());
    let severity = |title: &str| {
        report
            .insights
            .iter()
            .find(|c| c.title == title)
            .map(|c| c.severity)
    };
    assert_eq!(severity("Conversion"), Some(Severity::Warn));
    assert_eq!(severity("Buy Box"), Some(Severity::Warn));
    assert_eq!(severity("Mobile"), Some(Severity::Warn));
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[test]
fn returns_rate_and_value() {
    let fba = common::setup_sample_fba();
    let report = fba.returns().report(&ReportParams::new());
    let s = &report.summary;
    assert_eq!(s.total_returns, 3);
    assert_eq!(s.unique_skus, 2);
    approx(s.return_rate_pct, 100.0);
    // SKU-A priced at its mean order price of 12; SKU-Z was never ordered
    approx(s.total_value, 36.0);
    approx(s.avg_value, 12.0);
}

#[test]
fn returns_rankings() {
    let fba = common::setup_sample_fba();
    let report = fba.returns().report(&ReportParams::new());
    assert_eq!(report.value_by_reason[0].key, "Too small");
    approx(report.value_by_reason[0].value, 24.0);
    assert_eq!(report.count_by_reason[0].key, "Defective");
    assert_eq!(report.count_by_reason[0].count, 2);
    assert_eq!(report.count_by_sku[0].key, "SKU-A");
    assert_eq!(report.recent[0].record.sku, "SKU-Z");
    assert_eq!(report.recent[0].record.quantity, 1);
}

#[test]
fn returns_store_filter() {
    let fba = common::setup_sample_fba();
    let report = fba.returns().report(&ReportParams::new().store("US"));
    assert_eq!(report.summary.total_returns, 2);
    // O-1 and O-9 against the two US orders in range
    approx(report.summary.return_rate_pct, 100.0);

    let eu = fba.returns().report(&ReportParams::new().store("EU"));
    assert_eq!(eu.summary.total_returns, 1);
    approx(eu.summary.return_rate_pct, 100.0);
}

#[test]
fn return_rate_is_zero_without_orders() {
    let fba = common::setup_sample_fba();
    let range = DateRange::new(day("2023-01-01"), day("2023-01-31"));
    assert_eq!(fba.returns().return_rate(Some(range)), 0.0);
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[test]
fn reviews_summary_and_stars() {
    let fba = common::setup_sample_fba();
    let report = fba.reviews().report(&ReportParams::new());
    assert_eq!(report.summary.total, 15);
    assert_eq!(report.summary.asin_count, 3);
    assert_eq!(report.summary.marketplace_count, 2);
    assert_eq!(report.marketplaces, vec!["com", "de"]);
    assert_eq!(report.marketplace_labels, vec!["USA (com)", "Germany (de)"]);
    let stars: Vec<(u8, usize)> = report
        .star_counts
        .iter()
        .map(|s| (s.stars, s.count))
        .collect();
    assert_eq!(stars, vec![(5, 6), (4, 1), (3, 0), (2, 2), (1, 6)]);
}

#[test]
fn reviews_spotlights() {
    let fba = common::setup_sample_fba();
    let report = fba.reviews().report(&ReportParams::new());
    // ASIN-2 is the most negative but has only 4 reviews
    assert_eq!(report.worst_asin.as_ref().unwrap().key, "ASIN-3");
    assert_eq!(report.best_asin.as_ref().unwrap().key, "ASIN-1");
    let worst_market = report.worst_marketplace.as_ref().unwrap();
    assert_eq!(worst_market.key, "com");
    assert_eq!(worst_market.main_counterpart.as_deref(), Some("ASIN-3"));
    assert_eq!(report.by_asin[0].key, "ASIN-1");
}

#[test]
fn reviews_problem_variants_and_sample() {
    let fba = common::setup_sample_fba();
    let report = fba.reviews().report(&ReportParams::new());
    assert_eq!(report.problem_variants.len(), 2);
    assert_eq!(report.problem_variants[0].asin, "ASIN-2");
    assert_eq!(report.problem_variants[0].size, "L");
    assert_eq!(report.problem_variants[0].color, "Red");
    assert_eq!(report.sample.len(), 15);
    assert_eq!(report.sample[0].rating, 1);
    assert_eq!(report.heatmap.len(), 3);
}

#[test]
fn reviews_asin_focus() {
    let fba = common::setup_sample_fba();
    let report = fba.reviews().report(&ReportParams::new().asin("ASIN-1"));
    assert_eq!(report.summary.total, 6);
    assert_eq!(report.product_urls, vec!["https://www.amazon.com/dp/ASIN-1"]);
    assert_eq!(report.worst_asin.as_ref().unwrap().key, "ASIN-1");
    assert!(report
        .insights
        .iter()
        .all(|c| c.title != "Most negative ASIN"));
}

#[test]
fn reviews_marketplace_and_star_filters() {
    let fba = common::setup_sample_fba();
    let de = fba.reviews().report(&ReportParams::new().domains(["de"]));
    assert_eq!(de.summary.total, 4);
    assert_eq!(de.asins, vec!["ASIN-2"]);
    assert_eq!(de.marketplaces, vec!["com", "de"]);

    let ones = fba.reviews().filtered(&ReportParams::new().stars(&[1]));
    assert_eq!(ones.len(), 6);
}

#[test]
fn collected_reviews_per_target() {
    let fba = common::setup_sample_fba();
    let collected = fba.reviews().collected();
    assert_eq!(collected.total, 15);
    assert_eq!(collected.per_target[0].key, "ASIN-1@com");
    assert_eq!(collected.per_target[0].count, 6);
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

#[test]
fn overview_sections_are_independent() {
    let fba = common::setup_sample_fba();
    let report = fba.overview().report(&ReportParams::new());
    assert_eq!(report.inventory.total_units, 110);
    assert_eq!(report.top_by_available[0].sku, "SKU-A");
    let i = &report.insights;
    assert!(i.inventory.is_ready());
    assert!(i.settlements.is_ready());
    assert!(i.traffic.is_ready());
    assert!(i.orders.is_ready());
    assert!(i.returns.is_ready());
    assert!(i.reviews.is_ready());
}

#[test]
fn overview_missing_table_is_no_data() {
    let fba = common::empty_fba();
    common::write_table(
        fba.connection(),
        "orders",
        &[serde_json::json!({
            "Order ID": "O-1", "SKU": "SKU-A", "Order Date": "2024-03-01 10:00:00",
            "Quantity": 1, "Item Price": 5.0,
        })],
    );
    let report = fba.overview().report(&ReportParams::new());
    assert!(report.insights.orders.is_ready());
    assert_eq!(report.insights.settlements, Section::NoData);
    assert_eq!(report.insights.reviews, Section::NoData);
    assert_eq!(report.inventory.sku_count, 0);
}
