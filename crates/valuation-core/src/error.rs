use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
