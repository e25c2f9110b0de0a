use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Forecast horizon must be between 1 and 10 years, got {years}")]
    InvalidYears { years: u32 },

    #[error("No product ids supplied")]
    EmptyProductSet,

    #[error("No active products matched the supplied ids")]
    NoProductsMatched,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
