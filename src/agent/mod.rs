//! Decision-agent abstraction.
//!
//! The [`DecisionAgent`] trait decouples the control loop from whatever
//! produces input decisions. The loop only asks for an answer and queues
//! notices; how the answer is produced (a chat API, a person at a prompt)
//! is the adapter's business.

pub mod chat;
pub mod human;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::Result;

pub use chat::{ChatAgent, ChatAgentConfig};
pub use human::HumanAgent;

/// Something that turns a progress/image pair into an input answer.
///
/// Implementations keep a running conversational context across calls
/// within one episode; [`start_episode`](Self::start_episode) resets it.
pub trait DecisionAgent: Send {
    /// Human-readable name for logs.
    fn display_name(&self) -> &str;

    /// Stable identifier used as the `model=` value of playthrough files.
    fn identity(&self) -> &str;

    /// Reset the conversation and deliver the episode briefing.
    ///
    /// Returns the agent's reply to the briefing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Agent`](crate::AppError::Agent) if the agent
    /// cannot be reached after its own retries.
    fn start_episode<'a>(
        &'a mut self,
        briefing: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Ask for this window's inputs.
    ///
    /// Queued notices are included ahead of the request and then cleared.
    /// The returned text is raw; the caller validates it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Agent`](crate::AppError::Agent) if the agent
    /// cannot produce an answer after its own retries.
    fn propose_input<'a>(
        &'a mut self,
        progress: &'a str,
        image_path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Queue `notice` for the next [`propose_input`](Self::propose_input).
    fn set_context_notice(&mut self, notice: &str);
}

/// Pending notices for the next request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeQueue {
    notices: Vec<String>,
}

impl NoticeQueue {
    /// Queue one notice.
    pub fn push(&mut self, notice: &str) {
        self.notices.push(notice.to_owned());
    }

    /// Whether anything is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Take every queued notice as one text block, leaving the queue empty.
    pub fn drain_text(&mut self) -> String {
        std::mem::take(&mut self.notices).concat()
    }

    /// Drop queued notices.
    pub fn clear(&mut self) {
        self.notices.clear();
    }
}
