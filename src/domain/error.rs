use crate::domain::ports::completion::CompletionError;
use crate::domain::ports::market_data::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Market data error: {0}")]
    MarketData(#[from] GatewayError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
