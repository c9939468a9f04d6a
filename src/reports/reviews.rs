//! Review analytics and the scraped-review inventory.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::{mean, pct, top_n, value_counts, GroupBy};
use crate::config::{marketplace_label, product_url};
use crate::insights::review_insights;
use crate::insights::spotlight::{self, review_stats_by, MIN_REVIEWS_NESTED};
use crate::models::{
    HeatCell, InsightCard, KeyedCount, Review, ReviewStats, ReviewSummary, Spotlight, StarCount,
    VariantStats,
};

use super::{Loader, ReportParams};

/// Reviews kept per star rating in the browsing sample.
pub const SAMPLE_PER_STAR: usize = 100;
/// Variants rated below this are listed as problem variants.
pub const PROBLEM_VARIANT_RATING: f64 = 4.0;
pub const TOP_PROBLEM_VARIANTS: usize = 20;

const NO_VARIANT: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewsReport {
    pub asin: Option<String>,
    /// Marketplaces on record, sorted.
    pub marketplaces: Vec<String>,
    /// Display labels of `marketplaces`, same order.
    pub marketplace_labels: Vec<String>,
    /// ASINs available under the marketplace filter, sorted.
    pub asins: Vec<String>,
    pub summary: ReviewSummary,
    pub star_counts: Vec<StarCount>,
    pub by_asin: Vec<ReviewStats>,
    pub by_marketplace: Vec<ReviewStats>,
    pub worst_asin: Option<Spotlight>,
    pub best_asin: Option<Spotlight>,
    pub worst_marketplace: Option<Spotlight>,
    pub best_marketplace: Option<Spotlight>,
    pub heatmap: Vec<HeatCell>,
    pub problem_variants: Vec<VariantStats>,
    /// Product pages of the selected ASIN, one per marketplace.
    pub product_urls: Vec<String>,
    pub sample: Vec<Review>,
    pub insights: Vec<InsightCard>,
}

/// Review count per scraped product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedReviews {
    pub total: usize,
    /// Keyed `<asin>@<domain>`, most reviews first.
    pub per_target: Vec<KeyedCount>,
}

// ---------------------------------------------------------------------------
// Pure computations
// ---------------------------------------------------------------------------

pub fn summarize(reviews: &[Review]) -> ReviewSummary {
    let total = reviews.len() as f64;
    let ratings: Vec<f64> = reviews.iter().map(|r| f64::from(r.rating)).collect();
    let count = |f: fn(&Review) -> bool| reviews.iter().filter(|r| f(r)).count() as f64;
    ReviewSummary {
        total: reviews.len(),
        avg_rating: mean(&ratings),
        negative_pct: pct(count(Review::is_negative), total),
        positive_pct: pct(count(Review::is_positive), total),
        verified_pct: pct(count(|r| r.is_verified), total),
        asin_count: reviews
            .iter()
            .map(|r| r.asin.as_str())
            .collect::<BTreeSet<_>>()
            .len(),
        marketplace_count: reviews
            .iter()
            .map(|r| r.domain.as_str())
            .collect::<BTreeSet<_>>()
            .len(),
    }
}

/// Counts for 5 down to 1 stars, zero counts included.
pub fn star_counts(reviews: &[Review]) -> Vec<StarCount> {
    (1..=5u8)
        .rev()
        .map(|stars| StarCount {
            stars,
            count: reviews.iter().filter(|r| r.rating == stars).count(),
        })
        .collect()
}

/// Mean rating per (ASIN, marketplace) pair with at least one review.
pub fn heatmap(reviews: &[Review]) -> Vec<HeatCell> {
    GroupBy::new(reviews, |r| format!("{}\u{1f}{}", r.asin, r.domain))
        .count("reviews")
        .mean("rating", |r| f64::from(r.rating))
        .finish()
        .into_iter()
        .filter_map(|row| {
            let (asin, domain) = row.key.split_once('\u{1f}')?;
            Some(HeatCell {
                asin: asin.to_string(),
                domain: domain.to_string(),
                avg_rating: row.get("rating"),
                reviews: row.get("reviews") as usize,
            })
        })
        .collect()
}

/// Size/color variants rated under 4.0 with at least three reviews, most
/// negative first.
pub fn problem_variants(reviews: &[Review]) -> Vec<VariantStats> {
    let labelled: Vec<(String, String, &Review)> = reviews
        .iter()
        .filter_map(|r| match r.variant() {
            (None, None) => None,
            (size, color) => Some((
                size.unwrap_or_else(|| NO_VARIANT.to_string()),
                color.unwrap_or_else(|| NO_VARIANT.to_string()),
                r,
            )),
        })
        .collect();
    let variants: Vec<VariantStats> = GroupBy::new(&labelled, |(size, color, r)| {
        format!("{}\u{1f}{}\u{1f}{}", r.asin, size, color)
    })
    .count("reviews")
    .mean("rating", |(_, _, r)| f64::from(r.rating))
    .count_where("negative", |(_, _, r)| r.is_negative())
    .finish()
    .into_iter()
    .filter_map(|row| {
        let mut parts = row.key.splitn(3, '\u{1f}');
        let asin = parts.next()?.to_string();
        let size = parts.next()?.to_string();
        let color = parts.next()?.to_string();
        Some(VariantStats {
            asin,
            size,
            color,
            reviews: row.get("reviews") as usize,
            avg_rating: row.get("rating"),
            negative_pct: pct(row.get("negative"), row.get("reviews")),
        })
    })
    .filter(|v| v.reviews >= MIN_REVIEWS_NESTED && v.avg_rating < PROBLEM_VARIANT_RATING)
    .collect();
    top_n(&variants, TOP_PROBLEM_VARIANTS, |v| v.negative_pct)
}

/// At most `per_star` reviews of each rating, 1 star first, input order
/// kept within a rating.
pub fn balanced_sample(reviews: &[Review], per_star: usize) -> Vec<Review> {
    (1..=5u8)
        .flat_map(|stars| {
            reviews
                .iter()
                .filter(move |r| r.rating == stars)
                .take(per_star)
                .cloned()
        })
        .collect()
}

fn by_reviews_desc(stats: Vec<ReviewStats>) -> Vec<ReviewStats> {
    top_n(&stats, stats.len(), |s| s.reviews as f64)
}

// ---------------------------------------------------------------------------
// ReviewsQuery
// ---------------------------------------------------------------------------

/// Query interface for the reviews table.
pub struct ReviewsQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> ReviewsQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    /// Every review, newest first; undated reviews last.
    pub fn list(&self) -> Vec<Review> {
        let mut reviews = self.loader.reviews();
        reviews.sort_by(|a, b| b.review_date.cmp(&a.review_date));
        reviews
    }

    /// Reviews matching the marketplace, ASIN and star filters of `params`.
    pub fn filtered(&self, params: &ReportParams) -> Vec<Review> {
        self.list()
            .into_iter()
            .filter(|r| params.domains.is_empty() || params.domains.contains(&r.domain))
            .filter(|r| params.asin.as_deref().map_or(true, |a| r.asin == a))
            .filter(|r| params.stars.is_empty() || params.stars.contains(&r.rating))
            .collect()
    }

    pub fn collected(&self) -> CollectedReviews {
        let reviews = self.loader.reviews();
        CollectedReviews {
            total: reviews.len(),
            per_target: value_counts(reviews.iter().map(|r| format!("{}@{}", r.asin, r.domain))),
        }
    }

    pub fn report(&self, params: &ReportParams) -> ReviewsReport {
        let all = self.list();
        let in_marketplaces: Vec<&Review> = all
            .iter()
            .filter(|r| params.domains.is_empty() || params.domains.contains(&r.domain))
            .collect();
        let asins: Vec<String> = in_marketplaces
            .iter()
            .map(|r| r.asin.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let marketplaces: Vec<String> = all
            .iter()
            .map(|r| r.domain.clone())
            .filter(|d| !d.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let reviews = self.filtered(params);
        // Spotlights compare across the whole table unless one ASIN is in focus.
        let spot_base: &[Review] = match params.asin {
            Some(_) => &reviews,
            None => &all,
        };
        let product_urls = match params.asin.as_deref() {
            Some(asin) => all
                .iter()
                .filter(|r| r.asin == asin && !r.domain.is_empty())
                .map(|r| r.domain.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|d| product_url(&d, asin))
                .collect(),
            None => Vec::new(),
        };

        ReviewsReport {
            asin: params.asin.clone(),
            marketplace_labels: marketplaces.iter().map(|d| marketplace_label(d)).collect(),
            marketplaces,
            asins,
            summary: summarize(&reviews),
            star_counts: star_counts(&reviews),
            by_asin: by_reviews_desc(review_stats_by(&reviews, |r| r.asin.clone())),
            by_marketplace: by_reviews_desc(review_stats_by(&reviews, |r| r.domain.clone())),
            worst_asin: spotlight::worst_asin(spot_base),
            best_asin: spotlight::best_asin(spot_base),
            worst_marketplace: spotlight::worst_marketplace(spot_base),
            best_marketplace: spotlight::best_marketplace(spot_base),
            heatmap: heatmap(&reviews),
            problem_variants: problem_variants(&reviews),
            product_urls,
            sample: balanced_sample(&reviews, SAMPLE_PER_STAR),
            insights: review_insights(&reviews, params.asin.as_deref()),
        }
    }
}
