//! Insight rule engine.
//!
//! [`rules`] buckets a metric value into a [`Severity`](crate::models::Severity)
//! through a fixed threshold table, [`spotlight`] picks extremal entities, and
//! [`cards`] turns a domain's numbers into [`InsightCard`](crate::models::InsightCard)s.

pub mod cards;
pub mod rules;
pub mod spotlight;

pub use cards::{
    inventory_insights, order_insights, return_insights, review_insights, settlement_insights,
    traffic_insights,
};
pub use rules::{classify, Metric};
