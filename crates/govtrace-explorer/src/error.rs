use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("explorer API key rejected: {0}")]
    InvalidApiKey(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cache error: {0}")]
    Cache(#[from] govtrace_cache::CacheError),

    #[error("unexpected explorer response: {0}")]
    Malformed(String),
}
