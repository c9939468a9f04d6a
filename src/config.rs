use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default freshness window for cached report frames.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

pub const ENV_DATABASE_PATH: &str = "FBA_DATABASE_PATH";
pub const ENV_CACHE_TTL_SECS: &str = "FBA_CACHE_TTL_SECS";
pub const ENV_APIFY_TOKEN: &str = "APIFY_TOKEN";

pub const APIFY_REVIEWS_ENDPOINT: &str =
    "https://api.apify.com/v2/acts/junglee~amazon-reviews-scraper/run-sync-get-dataset-items";

/// Inventory age brackets, oldest last.
pub const AGE_BUCKETS: [&str; 5] = [
    "Upto 90 Days",
    "91 to 180 Days",
    "181 to 270 Days",
    "271 to 365 Days",
    "More than 365 Days",
];

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// One logical source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Inventory,
    Orders,
    Settlements,
    Traffic,
    Returns,
    Reviews,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Inventory,
        Domain::Orders,
        Domain::Settlements,
        Domain::Traffic,
        Domain::Returns,
        Domain::Reviews,
    ];

    /// Name of the backing table in the store.
    pub fn table(self) -> &'static str {
        match self {
            Domain::Inventory => "fba_inventory",
            Domain::Orders => "orders",
            Domain::Settlements => "settlements",
            Domain::Traffic => "sales_traffic",
            Domain::Returns => "returns",
            Domain::Reviews => "amazon_reviews",
        }
    }

    /// Priority-ordered source column names for each canonical field.
    pub fn aliases(self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Domain::Inventory => INVENTORY_ALIASES,
            Domain::Orders => ORDER_ALIASES,
            Domain::Settlements => SETTLEMENT_ALIASES,
            Domain::Traffic => TRAFFIC_ALIASES,
            Domain::Returns => RETURN_ALIASES,
            Domain::Reviews => REVIEW_ALIASES,
        }
    }
}

// ---------------------------------------------------------------------------
// Alias tables
// ---------------------------------------------------------------------------

const INVENTORY_ALIASES: &[(&str, &[&str])] = &[
    ("sku", &["SKU", "sku", "seller-sku", "seller_sku", "Seller SKU"]),
    ("asin", &["ASIN", "asin"]),
    ("store_name", &["Store Name", "store_name", "store", "Marketplace"]),
    ("product_name", &["Product Name", "product_name", "product-name", "Title"]),
    ("available", &["Available", "available", "afn-fulfillable-quantity", "fulfillable_quantity"]),
    ("inbound", &["Inbound", "inbound", "inbound_quantity", "afn-inbound-shipped-quantity"]),
    ("reserved", &["Reserved", "reserved", "reserved_quantity", "afn-reserved-quantity"]),
    ("price", &["Price", "price", "your-price", "your_price"]),
    ("velocity", &["Velocity", "velocity", "units_per_day"]),
    ("created_at", &["created_at", "Created At", "snapshot_date", "snapshot-date"]),
    ("Upto 90 Days", &["Upto 90 Days", "inv_age_0_to_90_days", "inv-age-0-to-90-days"]),
    ("91 to 180 Days", &["91 to 180 Days", "inv_age_91_to_180_days", "inv-age-91-to-180-days"]),
    ("181 to 270 Days", &["181 to 270 Days", "inv_age_181_to_270_days", "inv-age-181-to-270-days"]),
    ("271 to 365 Days", &["271 to 365 Days", "inv_age_271_to_365_days", "inv-age-271-to-365-days"]),
    ("More than 365 Days", &["More than 365 Days", "inv_age_365_plus_days", "inv-age-365-plus-days"]),
];

const ORDER_ALIASES: &[(&str, &[&str])] = &[
    ("order_id", &["Order ID", "order-id", "order_id", "OrderID", "amazon-order-id"]),
    ("sku", &["SKU", "sku", "seller-sku", "seller_sku"]),
    ("order_date", &["Order Date", "order-date", "order_date", "purchase-date", "purchase_date"]),
    ("quantity", &["Quantity", "quantity", "qty"]),
    ("item_price", &["Item Price", "item-price", "item_price", "price"]),
    ("item_tax", &["Item Tax", "item-tax", "item_tax", "tax"]),
    ("shipping_price", &["Shipping Price", "shipping-price", "shipping_price", "shipping"]),
    ("status", &["Order Status", "order-status", "order_status", "status"]),
    ("store_name", &["Store Name", "store_name", "store"]),
];

const SETTLEMENT_ALIASES: &[(&str, &[&str])] = &[
    ("posted_date", &["Posted Date", "posted-date", "posted_date"]),
    ("transaction_type", &["Transaction Type", "transaction-type", "transaction_type", "type"]),
    ("order_id", &["Order ID", "order-id", "order_id"]),
    ("amount", &["Amount", "amount", "total"]),
    ("currency", &["Currency", "currency"]),
    ("quantity", &["Quantity", "quantity", "quantity-purchased"]),
    ("description", &["Description", "description"]),
];

const TRAFFIC_ALIASES: &[(&str, &[&str])] = &[
    ("report_date", &["report_date", "Report Date", "date"]),
    ("created_at", &["created_at"]),
    ("child_asin", &["child_asin", "Child ASIN", "(Child) ASIN", "asin"]),
    ("sessions", &["sessions", "Sessions"]),
    ("page_views", &["page_views", "Page Views"]),
    ("units_ordered", &["units_ordered", "Units Ordered"]),
    ("ordered_product_sales", &["ordered_product_sales", "Ordered Product Sales"]),
    ("buy_box_percentage", &["buy_box_percentage", "Buy Box Percentage", "featured_offer_percentage"]),
    ("mobile_sessions", &["mobile_sessions"]),
    ("browser_sessions", &["browser_sessions"]),
    ("mobile_page_views", &["mobile_page_views"]),
    ("browser_page_views", &["browser_page_views"]),
];

const RETURN_ALIASES: &[(&str, &[&str])] = &[
    ("return_date", &["Return Date", "return-date", "return_date"]),
    ("order_id", &["Order ID", "order-id", "order_id", "OrderID"]),
    ("sku", &["SKU", "sku", "seller-sku"]),
    ("product_name", &["Product Name", "product-name", "product_name"]),
    ("quantity", &["Quantity", "quantity", "qty"]),
    ("price", &["Price", "price"]),
    ("reason", &["Reason", "reason", "return-reason"]),
    ("status", &["Status", "status"]),
    ("store_name", &["Store Name", "store_name"]),
];

const REVIEW_ALIASES: &[(&str, &[&str])] = &[
    ("review_id", &["review_id", "reviewId"]),
    ("asin", &["asin", "ASIN"]),
    ("domain", &["domain", "marketplace"]),
    ("rating", &["rating", "ratingScore", "stars"]),
    ("is_verified", &["is_verified", "isVerified", "verified"]),
    ("review_date", &["review_date", "date"]),
    ("title", &["title", "reviewTitle"]),
    ("content", &["content", "reviewDescription", "body"]),
    ("author", &["author"]),
    ("product_attributes", &["product_attributes", "variant"]),
];

/// Every backing table name, in [`Domain::ALL`] order.
pub fn table_names() -> [&'static str; 6] {
    Domain::ALL.map(Domain::table)
}

// ---------------------------------------------------------------------------
// Marketplaces and paths
// ---------------------------------------------------------------------------

/// Human-readable label for a marketplace domain code (e.g. `co.uk`).
pub fn marketplace_label(domain: &str) -> String {
    let country = match domain {
        "com" => "USA",
        "ca" => "Canada",
        "de" => "Germany",
        "co.uk" => "UK",
        "it" => "Italy",
        "es" => "Spain",
        "fr" => "France",
        "co.jp" => "Japan",
        "com.au" => "Australia",
        "com.mx" => "Mexico",
        "nl" => "Netherlands",
        "pl" => "Poland",
        "se" => "Sweden",
        _ => return domain.to_string(),
    };
    format!("{} ({})", country, domain)
}

pub fn product_url(domain: &str, asin: &str) -> String {
    format!("https://www.amazon.{}/dp/{}", domain, asin)
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("fba-insights")
    } else {
        PathBuf::from(".fba-insights")
    }
}
