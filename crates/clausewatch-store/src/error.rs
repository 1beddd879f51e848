use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report not found: {0}")]
    NotFound(String),

    #[error("user id must not be empty")]
    InvalidUser,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("{0}")]
    Other(String),
}
