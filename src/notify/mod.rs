pub mod wecom;

pub use wecom::{split_message, WeComNotifier};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("webhook request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("webhook returned HTTP {0}")]
    Status(u16),

    #[error("webhook rejected message: errcode {errcode}, {errmsg}")]
    Api { errcode: i64, errmsg: String },
}

/// Outcome of a delivery attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Number of posts the report was split into
    Sent { messages: usize },
    /// No webhook configured
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NotifyError::Api {
            errcode: 93000,
            errmsg: "invalid webhook url".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "webhook rejected message: errcode 93000, invalid webhook url"
        );
        assert_eq!(NotifyError::Status(404).to_string(), "webhook returned HTTP 404");
    }
}
