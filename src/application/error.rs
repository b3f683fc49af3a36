use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::domain::PeriodError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    InvalidPeriod(#[from] PeriodError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Nothing cached for {0}")]
    NotCached(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Api(e) => e.is_retryable(),
            _ => false,
        }
    }
}
