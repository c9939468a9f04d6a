use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FbaError;
use crate::models::Severity;

/// A metric with a fixed threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    NetMargin,
    FeeLoad,
    RefundRate,
    ReturnRate,
    BuyBox,
    Conversion,
    AvgRating,
    NegativeReviewPct,
    StockCoverDays,
    PositiveReviewPct,
    VerifiedReviewPct,
    MobileSharePct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    AtLeast,
    AtMost,
}

/// One row of a threshold table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub cmp: Cmp,
    pub bound: f64,
    pub severity: Severity,
}

impl Tier {
    const fn at_least(bound: f64, severity: Severity) -> Self {
        Self {
            cmp: Cmp::AtLeast,
            bound,
            severity,
        }
    }

    const fn at_most(bound: f64, severity: Severity) -> Self {
        Self {
            cmp: Cmp::AtMost,
            bound,
            severity,
        }
    }

    fn matches(&self, value: f64) -> bool {
        match self.cmp {
            Cmp::AtLeast => value >= self.bound,
            Cmp::AtMost => value <= self.bound,
        }
    }
}

/// Tiers are checked in order; the first match wins, else `otherwise`.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub tiers: &'static [Tier],
    pub otherwise: Severity,
}

use Severity::{Bad, Good, Warn};

const NET_MARGIN: Rule = Rule {
    tiers: &[Tier::at_least(30.0, Good), Tier::at_least(15.0, Warn)],
    otherwise: Bad,
};
const FEE_LOAD: Rule = Rule {
    tiers: &[Tier::at_most(30.0, Good), Tier::at_most(40.0, Warn)],
    otherwise: Bad,
};
const REFUND_RATE: Rule = Rule {
    tiers: &[Tier::at_most(3.0, Good), Tier::at_most(8.0, Warn)],
    otherwise: Bad,
};
const RETURN_RATE: Rule = REFUND_RATE;
const BUY_BOX: Rule = Rule {
    tiers: &[Tier::at_least(95.0, Good), Tier::at_least(80.0, Warn)],
    otherwise: Bad,
};
const CONVERSION: Rule = Rule {
    tiers: &[Tier::at_least(12.0, Good), Tier::at_least(8.0, Warn)],
    otherwise: Bad,
};
const AVG_RATING: Rule = Rule {
    tiers: &[Tier::at_least(4.4, Good), Tier::at_least(4.0, Warn)],
    otherwise: Bad,
};
const NEGATIVE_REVIEWS: Rule = Rule {
    tiers: &[Tier::at_most(10.0, Good), Tier::at_most(20.0, Warn)],
    otherwise: Bad,
};
const STOCK_COVER: Rule = Rule {
    tiers: &[Tier::at_most(30.0, Bad), Tier::at_most(60.0, Warn)],
    otherwise: Good,
};
const POSITIVE_REVIEWS: Rule = Rule {
    tiers: &[Tier::at_least(70.0, Good)],
    otherwise: Warn,
};
const VERIFIED_REVIEWS: Rule = Rule {
    tiers: &[Tier::at_least(80.0, Good)],
    otherwise: Warn,
};
const MOBILE_SHARE: Rule = Rule {
    tiers: &[Tier::at_least(60.0, Good)],
    otherwise: Warn,
};

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::NetMargin,
        Metric::FeeLoad,
        Metric::RefundRate,
        Metric::ReturnRate,
        Metric::BuyBox,
        Metric::Conversion,
        Metric::AvgRating,
        Metric::NegativeReviewPct,
        Metric::StockCoverDays,
        Metric::PositiveReviewPct,
        Metric::VerifiedReviewPct,
        Metric::MobileSharePct,
    ];

    pub fn rule(self) -> Rule {
        match self {
            Metric::NetMargin => NET_MARGIN,
            Metric::FeeLoad => FEE_LOAD,
            Metric::RefundRate => REFUND_RATE,
            Metric::ReturnRate => RETURN_RATE,
            Metric::BuyBox => BUY_BOX,
            Metric::Conversion => CONVERSION,
            Metric::AvgRating => AVG_RATING,
            Metric::NegativeReviewPct => NEGATIVE_REVIEWS,
            Metric::StockCoverDays => STOCK_COVER,
            Metric::PositiveReviewPct => POSITIVE_REVIEWS,
            Metric::VerifiedReviewPct => VERIFIED_REVIEWS,
            Metric::MobileSharePct => MOBILE_SHARE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::NetMargin => "net_margin",
            Metric::FeeLoad => "fee_load",
            Metric::RefundRate => "refund_rate",
            Metric::ReturnRate => "return_rate",
            Metric::BuyBox => "buy_box",
            Metric::Conversion => "conversion",
            Metric::AvgRating => "avg_rating",
            Metric::NegativeReviewPct => "negative_review_pct",
            Metric::StockCoverDays => "stock_cover_days",
            Metric::PositiveReviewPct => "positive_review_pct",
            Metric::VerifiedReviewPct => "verified_review_pct",
            Metric::MobileSharePct => "mobile_share_pct",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = FbaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| FbaError::InvalidArgument(format!("unknown metric '{}'", s)))
    }
}

/// Tier of `value` for `metric`. Compares at full precision.
pub fn classify(metric: Metric, value: f64) -> Severity {
    let rule = metric.rule();
    rule.tiers
        .iter()
        .find(|t| t.matches(value))
        .map(|t| t.severity)
        .unwrap_or(rule.otherwise)
}
