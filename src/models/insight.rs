use serde::{Deserialize, Serialize};

/// Qualitative tier of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warn,
    Bad,
    /// Informational; no judgement attached.
    Neutral,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Good => "good",
            Severity::Warn => "warn",
            Severity::Bad => "bad",
            Severity::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// One derived observation, ready for any front end to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCard {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub metric_value: Option<f64>,
}

impl InsightCard {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            metric_value: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.metric_value = Some(value);
        self
    }
}
