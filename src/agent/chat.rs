//! Decision agent backed by an OpenAI-compatible chat-completions API.
//!
//! The whole episode is one conversation: every request carries the full
//! message history, and [`DecisionAgent::start_episode`] starts a new one.
//! Rate limits and server errors are retried here with a fixed or
//! server-provided delay; the control loop only sees the added latency.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::agent::{DecisionAgent, NoticeQueue};
use crate::{AppError, Result};

/// Settings for [`ChatAgent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAgentConfig {
    /// Model code sent in each request.
    pub model: String,
    /// Value used for the playthrough `model=` key.
    pub identity: String,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Whether to prefix each request with `Progress: <p>`.
    pub include_progress: bool,
    /// Wait after HTTP 429 when the server gives no `Retry-After`.
    pub rate_limit_delay: Duration,
    /// Wait after a 5xx or a transport error.
    pub error_delay: Duration,
    /// Give up after this many attempts per request; 0 retries forever.
    pub max_attempts: u32,
}

/// Chat-completions decision agent.
pub struct ChatAgent {
    config: ChatAgentConfig,
    http: reqwest::Client,
    messages: Vec<Value>,
    notices: NoticeQueue,
}

impl ChatAgent {
    /// Build an agent with an empty conversation.
    #[must_use]
    pub fn new(config: ChatAgentConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            messages: Vec::new(),
            notices: NoticeQueue::default(),
        }
    }

    /// Messages sent so far in this episode, including replies.
    #[must_use]
    pub fn history(&self) -> &[Value] {
        &self.messages
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Append a user turn, send the conversation, and record the reply.
    async fn converse(&mut self, content: Value) -> Result<String> {
        self.messages.push(json!({ "role": "user", "content": content }));
        let body = json!({
            "model": self.config.model,
            "messages": self.messages,
        });

        let reply = self.send_with_retry(&body).await?;
        self.messages
            .push(json!({ "role": "assistant", "content": reply }));
        Ok(reply)
    }

    async fn send_with_retry(&self, body: &Value) -> Result<String> {
        let url = self.endpoint();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let delay = match self
                .http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    let payload: Value = response.json().await?;
                    return extract_reply(&payload);
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let delay = retry_after(&response).unwrap_or(self.config.rate_limit_delay);
                    warn!(attempt, delay_s = delay.as_secs(), "rate limit reached");
                    delay
                }
                Ok(response) if response.status().is_server_error() => {
                    warn!(attempt, status = %response.status(), "chat api server error");
                    self.config.error_delay
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    return Err(AppError::Agent(format!(
                        "chat api returned {status}: {text}"
                    )));
                }
                Err(err) => {
                    warn!(attempt, %err, "chat api request failed");
                    self.config.error_delay
                }
            };

            if self.config.max_attempts != 0 && attempt >= self.config.max_attempts {
                return Err(AppError::Agent(format!(
                    "chat api unavailable after {attempt} attempt(s)"
                )));
            }
            tokio::time::sleep(delay).await;
        }
    }
}

/// Seconds from a numeric `Retry-After` header.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pull `choices[0].message.content` out of a completion.
///
/// # Errors
///
/// Returns `AppError::Agent` if the payload has no text content.
pub fn extract_reply(payload: &Value) -> Result<String> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| AppError::Agent(format!("completion has no text content: {payload}")))
}

impl DecisionAgent for ChatAgent {
    fn display_name(&self) -> &str {
        &self.config.model
    }

    fn identity(&self) -> &str {
        &self.config.identity
    }

    fn start_episode<'a>(
        &'a mut self,
        briefing: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.messages.clear();
            self.notices.clear();
            self.converse(json!([{ "type": "text", "text": briefing }]))
                .await
        })
    }

    fn propose_input<'a>(
        &'a mut self,
        progress: &'a str,
        image_path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let png = tokio::fs::read(image_path).await.map_err(|err| {
                AppError::Io(format!("failed to read {}: {err}", image_path.display()))
            })?;

            let mut text = self.notices.drain_text();
            if self.config.include_progress {
                text.push_str("Progress: ");
                text.push_str(progress);
                text.push('\n');
            }

            let mut content = Vec::new();
            if !text.is_empty() {
                content.push(json!({ "type": "text", "text": text }));
            }
            content.push(json!({
                "type": "image_url",
                "image_url": { "url": format!("data:image/png;base64,{}", STANDARD.encode(&png)) },
            }));

            let reply = self.converse(Value::Array(content)).await?;
            debug!(reply = %reply, "chat agent answered");
            Ok(reply)
        })
    }

    fn set_context_notice(&mut self, notice: &str) {
        self.notices.push(notice);
    }
}
