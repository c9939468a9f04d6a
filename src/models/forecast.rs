use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_available: i64,
}

/// Output of the linear trend model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Fitted units per day.
    pub slope: f64,
    pub intercept: f64,
    pub last_observed: NaiveDate,
    pub predictions: Vec<ForecastPoint>,
    pub sold_out_date: Option<NaiveDate>,
    /// Days from `last_observed` to `sold_out_date`.
    pub days_left: Option<i64>,
}
