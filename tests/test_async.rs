//! Async wrapper tests. Run with `--features async`.

#![cfg(feature = "async")]

mod common;

use fba_insights::{AccessGate, Actor, AsyncFbaInsights, Report, ReportParams, ReportView};

#[tokio::test]
async fn open_report_on_blocking_pool() {
    let fba = AsyncFbaInsights::from_sync(common::setup_sample_fba());
    let outcome = fba
        .open_report(Actor::admin("boss@example.com"), Report::Orders, ReportParams::new())
        .await
        .unwrap();
    assert!(matches!(outcome.view(), Some(ReportView::Orders(_))));
}

#[tokio::test]
async fn run_and_sql() {
    let fba = AsyncFbaInsights::from_sync(common::setup_sample_fba());
    let skus = fba.run(|f| Ok(f.forecasts().skus())).await.unwrap();
    assert_eq!(skus, vec!["SKU-A", "SKU-B", "SKU-C"]);

    let rows = fba
        .sql("SELECT COUNT(*) AS n FROM returns", &[])
        .await
        .unwrap();
    assert_eq!(rows[0]["n"].as_i64(), Some(3));
    fba.invalidate_all().await.unwrap();
}

#[tokio::test]
async fn builder_opens_in_memory() {
    let fba = AsyncFbaInsights::builder().build().await.unwrap();
    let n = fba.run(|f| Ok(f.cache().len())).await.unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn builder_accepts_custom_gate() {
    struct OrdersOnly;
    impl AccessGate for OrdersOnly {
        fn can_view(&self, _actor: &Actor, report: Report) -> bool {
            report == Report::Orders
        }
    }
    let fba = AsyncFbaInsights::builder()
        .gate(OrdersOnly)
        .build()
        .await
        .unwrap();
    let outcome = fba
        .open_report(Actor::admin("boss@example.com"), Report::Returns, ReportParams::new())
        .await
        .unwrap();
    assert!(outcome.is_denied());
    let permitted = fba
        .run(|f| Ok(f.permitted_reports(&Actor::admin("boss@example.com"))))
        .await
        .unwrap();
    assert_eq!(permitted.into_iter().collect::<Vec<_>>(), vec![Report::Orders]);
}
