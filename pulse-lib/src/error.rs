use thiserror::Error;

/// Errors that can occur in the collector
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Counter store error: {0}")]
    Store(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<redis::RedisError> for CollectorError {
    fn from(e: redis::RedisError) -> Self {
        CollectorError::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;
