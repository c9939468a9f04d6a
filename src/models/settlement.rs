use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Settlement: one ledger transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub posted_date: NaiveDateTime,
    /// `Order`, `Refund`, or any fee/adjustment label.
    pub transaction_type: String,
    pub order_id: String,
    /// Signed; positive is money paid to the seller.
    pub amount: f64,
    pub currency: String,
    pub quantity: i64,
    pub description: String,
}

impl Settlement {
    pub fn is_order(&self) -> bool {
        self.transaction_type == "Order"
    }

    pub fn is_refund(&self) -> bool {
        self.transaction_type == "Refund"
    }
}

// ---------------------------------------------------------------------------
// SettlementSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub net_payout: f64,
    pub gross_sales: f64,
    /// Signed (negative) sum of fees.
    pub fees: f64,
    /// Signed (negative) sum of refunds.
    pub refunds: f64,
    pub margin_pct: f64,
    pub fee_pct: f64,
    pub refund_pct: f64,
    pub transaction_count: usize,
}
