#[derive(Debug, thiserror::Error)]
pub enum FbaError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing store could not be reached or a query failed.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A computation was asked to run below its minimum sample size.
    #[error("Insufficient data for {what}: need {required}, have {actual}")]
    InsufficientData {
        what: String,
        required: usize,
        actual: usize,
    },

    #[error("Access denied: {0}")]
    AccessDenied(String),
}

pub type Result<T> = std::result::Result<T, FbaError>;
