//! Sold-out forecast report for one SKU.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{FbaError, Result};
use crate::forecast::forecast_sku;
use crate::models::{DailyValue, Forecast, InventorySnapshot};
use crate::snapshot::latest_per_day;

use super::{Loader, ReportParams, Section};

pub const DEFAULT_HORIZON_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub sku: String,
    /// Every SKU with history, sorted.
    pub skus: Vec<String>,
    pub horizon_days: u32,
    /// Observed available units per snapshot day.
    pub history: Vec<DailyValue>,
    pub forecast: Section<Forecast>,
}

/// Query interface for stock forecasts.
pub struct ForecastQuery<'a> {
    loader: Loader<'a>,
}

impl<'a> ForecastQuery<'a> {
    pub(crate) fn new(loader: Loader<'a>) -> Self {
        Self { loader }
    }

    fn history(&self) -> Vec<InventorySnapshot> {
        latest_per_day(&self.loader.inventory())
    }

    pub fn skus(&self) -> Vec<String> {
        self.history()
            .into_iter()
            .map(|s| s.sku)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Forecast `sku` over `horizon_days`.
    pub fn forecast(&self, sku: &str, horizon_days: u32) -> Result<Forecast> {
        forecast_sku(&self.history(), sku, horizon_days)
    }

    /// Forecast the requested SKU, or the first SKU alphabetically.
    pub fn report(&self, params: &ReportParams) -> Result<ForecastReport> {
        let snapshots = self.history();
        let skus: Vec<String> = snapshots
            .iter()
            .map(|s| s.sku.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let sku = match params.sku.clone().or_else(|| skus.first().cloned()) {
            Some(sku) => sku,
            None => return Err(FbaError::NotFound("no inventory history".to_string())),
        };
        let horizon_days = params.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);

        let mut rows: Vec<&InventorySnapshot> =
            snapshots.iter().filter(|s| s.sku == sku).collect();
        rows.sort_by_key(|s| s.created_at);
        let history = rows
            .iter()
            .map(|s| DailyValue {
                date: s.snapshot_date(),
                value: s.available as f64,
            })
            .collect();

        Ok(ForecastReport {
            forecast: Section::from_result(forecast_sku(&snapshots, &sku, horizon_days)),
            sku,
            skus,
            horizon_days,
            history,
        })
    }
}
