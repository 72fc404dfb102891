use thiserror::Error;

/// Classified transport failures surfaced by the fetcher.
///
/// Each variant maps to distinct user-facing copy in the embedding UI, so
/// they stay separate rather than collapsing into one opaque error. No
/// retries happen at this layer; retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("server rejected the request (HTTP {0})")]
    HttpClient(u16),

    #[error("server failed to respond (HTTP {0})")]
    HttpServer(u16),

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
