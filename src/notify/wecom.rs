use crate::notify::{Delivery, NotifyError};
use crate::utils::config::NotifyConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Bytes kept free for the `【title (i/n)】` header of split posts
const HEADER_RESERVE: usize = 24;

#[derive(Debug, Deserialize)]
struct WeComResponse {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// WeCom (企业微信) group robot, plain-text messages
pub struct WeComNotifier {
    client: Client,
    url: String,
    max_message_bytes: usize,
}

impl WeComNotifier {
    pub fn new(settings: &NotifyConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(NotifyError::Client)?;

        Ok(Self {
            client,
            url: settings.webhook_url.clone(),
            max_message_bytes: settings.max_message_bytes,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    /// Text message body as the robot API expects it
    pub fn build_payload(content: &str) -> Value {
        json!({
            "msgtype": "text",
            "text": {
                "content": content
            }
        })
    }

    /// Push a titled report, split into several posts when it exceeds the
    /// robot's size limit. Stops at the first rejected post.
    pub async fn send(&self, title: &str, content: &str) -> Result<Delivery, NotifyError> {
        if !self.is_configured() {
            warn!("No webhook URL configured, skipping notification");
            return Ok(Delivery::Skipped);
        }

        let messages = split_message(title, content, self.max_message_bytes);
        for (i, message) in messages.iter().enumerate() {
            self.post(message).await?;
            info!("Webhook post {}/{} delivered", i + 1, messages.len());
        }

        Ok(Delivery::Sent {
            messages: messages.len(),
        })
    }

    async fn post(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::build_payload(message))
            .send()
            .await
            .map_err(NotifyError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        let body: WeComResponse = response.json().await.map_err(NotifyError::Http)?;
        if body.errcode != 0 {
            return Err(NotifyError::Api {
                errcode: body.errcode,
                errmsg: body.errmsg,
            });
        }

        Ok(())
    }
}

/// Split `content` on line boundaries so every message, header included,
/// stays within `max_bytes`. A single message is titled `【title】`; several
/// are titled `【title (i/n)】`. Lines longer than the budget are cut at
/// character boundaries.
pub fn split_message(title: &str, content: &str, max_bytes: usize) -> Vec<String> {
    let single = format!("【{}】\n\n{}", title, content);
    if single.len() <= max_bytes {
        return vec![single];
    }

    let budget = max_bytes
        .saturating_sub(title.len() + HEADER_RESERVE)
        .max(16);

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    // blank lines leave `current` empty, so count lines instead
    let mut lines_in_chunk = 0usize;

    for line in content.lines() {
        for piece in cut_line(line, budget) {
            if lines_in_chunk > 0 && current.len() + 1 + piece.len() > budget {
                chunks.push(std::mem::take(&mut current));
                lines_in_chunk = 0;
            }
            if lines_in_chunk > 0 {
                current.push('\n');
            }
            current.push_str(piece);
            lines_in_chunk += 1;
        }
    }
    if lines_in_chunk > 0 {
        chunks.push(current);
    }

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("【{} ({}/{})】\n\n{}", title, i + 1, total, chunk))
        .collect()
}

/// Cut a line into pieces of at most `budget` bytes without splitting a char
fn cut_line(line: &str, budget: usize) -> Vec<&str> {
    if line.len() <= budget {
        return vec![line];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    while start < line.len() {
        let mut end = (start + budget).min(line.len());
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        pieces.push(&line[start..end]);
        start = end;
    }
    pieces
}
