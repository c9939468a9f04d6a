//! Sold-out forecast.
//!
//! A plain linear trend: ordinary least squares of stock level against the
//! ordinal day, projected forward. There is no seasonality and no confidence
//! interval; treat the output as a rough trend line.

use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::error::{FbaError, Result};
use crate::models::{Forecast, ForecastPoint, InventorySnapshot};

/// History points needed before a trend is fitted.
pub const MIN_HISTORY: usize = 3;

/// Fit `history` and project `horizon_days` past its last date.
///
/// Predictions are truncated toward zero and floored at 0. `sold_out_date`
/// is the first projected day that reaches 0.
pub fn forecast(history: &[(NaiveDate, f64)], horizon_days: u32) -> Result<Forecast> {
    if history.len() < MIN_HISTORY {
        return Err(FbaError::InsufficientData {
            what: "stock forecast".to_string(),
            required: MIN_HISTORY,
            actual: history.len(),
        });
    }
    if horizon_days == 0 {
        return Err(FbaError::InvalidArgument(
            "forecast horizon must be at least one day".to_string(),
        ));
    }

    let xs: Vec<f64> = history
        .iter()
        .map(|(d, _)| f64::from(d.num_days_from_ce()))
        .collect();
    let ys: Vec<f64> = history.iter().map(|(_, y)| *y).collect();
    let (slope, intercept) = least_squares(&xs, &ys);

    let last_observed = history
        .iter()
        .map(|(d, _)| *d)
        .max()
        .ok_or_else(|| FbaError::InvalidArgument("empty history".to_string()))?;

    let predictions: Vec<ForecastPoint> = (1..=i64::from(horizon_days))
        .map(|offset| {
            let date = last_observed + TimeDelta::days(offset);
            let raw = slope * f64::from(date.num_days_from_ce()) + intercept;
            ForecastPoint {
                date,
                predicted_available: (raw.trunc() as i64).max(0),
            }
        })
        .collect();

    let sold_out_date = predictions
        .iter()
        .find(|p| p.predicted_available == 0)
        .map(|p| p.date);

    Ok(Forecast {
        slope,
        intercept,
        last_observed,
        days_left: sold_out_date.map(|d| (d - last_observed).num_days()),
        sold_out_date,
        predictions,
    })
}

/// Slope and intercept of the OLS line. A zero-variance x gives a flat line
/// through the mean of y.
fn least_squares(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx == 0.0 {
        return (0.0, mean_y);
    }
    let slope = sxy / sxx;
    (slope, mean_y - slope * mean_x)
}

/// Forecast one SKU from its inventory snapshots.
pub fn forecast_sku(
    snapshots: &[InventorySnapshot],
    sku: &str,
    horizon_days: u32,
) -> Result<Forecast> {
    let mut rows: Vec<&InventorySnapshot> = snapshots.iter().filter(|s| s.sku == sku).collect();
    if rows.is_empty() {
        return Err(FbaError::NotFound(format!("no inventory history for SKU '{}'", sku)));
    }
    rows.sort_by_key(|s| s.created_at);
    let history: Vec<(NaiveDate, f64)> = rows
        .iter()
        .map(|s| (s.created_at.date(), s.available as f64))
        .collect();
    forecast(&history, horizon_days)
}
