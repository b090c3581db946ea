use thiserror::Error;

/// Failures while pulling a market feed
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed {0} is not configured")]
    Disabled(String),

    #[error("request to {feed} failed: {source}")]
    Http {
        feed: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{feed} returned HTTP {status}")]
    Status { feed: String, status: u16 },

    #[error("{feed} body is not JSON: {source}")]
    Decode {
        feed: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{feed} payload has no record list: {reason}")]
    Payload { feed: String, reason: String },
}

impl FeedError {
    /// Disabled feeds are expected and only worth an info line
    pub fn is_disabled(&self) -> bool {
        matches!(self, FeedError::Disabled(_))
    }
}
