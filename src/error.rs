use thiserror::Error;

/// Crate-wide error type for the sourcing service
#[derive(Error, Debug)]
pub enum SourcingError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Failed to create connection pool: {0}")]
    PoolCreation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Upstream service error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SourcingError>;
