use thiserror::Error;

/// Failure while fetching one region of the dashboard from the backend.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid API url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not available from this source")]
    Unavailable(&'static str),
    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode preference: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to create preference directory '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
