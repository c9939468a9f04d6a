use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Review: one customer review
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub asin: String,
    /// Marketplace domain code, lower-cased (e.g. `com`, `co.uk`).
    pub domain: String,
    pub rating: u8,
    pub is_verified: bool,
    pub review_date: Option<NaiveDate>,
    pub title: String,
    pub content: String,
    pub author: String,
    /// Free text such as `Size: M, Color: Blue`.
    pub product_attributes: String,
}

impl Review {
    pub fn is_negative(&self) -> bool {
        self.rating <= 2
    }

    pub fn is_positive(&self) -> bool {
        self.rating >= 4
    }

    /// `(size, color)` parsed from `product_attributes`.
    pub fn variant(&self) -> (Option<String>, Option<String>) {
        let mut size = None;
        let mut color = None;
        for part in self.product_attributes.split(',') {
            let part = part.trim();
            let Some((label, value)) = part.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match label.trim().to_lowercase().as_str() {
                "size" => size = Some(value.to_string()),
                "color" | "colour" => color = Some(value.to_string()),
                _ => {}
            }
        }
        (size, color)
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Review statistics for one group (ASIN, marketplace, variant, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub key: String,
    pub reviews: usize,
    pub avg_rating: f64,
    pub negative: usize,
    pub positive: usize,
    pub negative_pct: f64,
    pub positive_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub avg_rating: f64,
    pub negative_pct: f64,
    pub positive_pct: f64,
    pub verified_pct: f64,
    pub asin_count: usize,
    pub marketplace_count: usize,
}

/// An extremal entity selected from a stats table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spotlight {
    pub key: String,
    pub stats: ReviewStats,
    /// Marketplace (or ASIN) contributing the most reviews to this entity.
    pub main_counterpart: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarCount {
    pub stars: u8,
    pub count: usize,
}

/// Mean rating of one ASIN in one marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    pub asin: String,
    pub domain: String,
    pub avg_rating: f64,
    pub reviews: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantStats {
    pub asin: String,
    pub size: String,
    pub color: String,
    pub reviews: usize,
    pub avg_rating: f64,
    pub negative_pct: f64,
}
