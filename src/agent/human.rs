//! Decision agent backed by a person typing at the terminal.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use crate::agent::{DecisionAgent, NoticeQueue};
use crate::{AppError, Result};

/// Single-letter direction shortcuts accepted at the prompt.
const SHORTCUTS: &[(&str, &str)] = &[("l", "left"), ("d", "down"), ("r", "right"), ("u", "up")];

/// Expand shortcuts in a comma-separated answer: `l, a` becomes `left,a`.
#[must_use]
pub fn expand_shortcuts(answer: &str) -> String {
    answer
        .split(',')
        .map(str::trim)
        .map(|token| {
            SHORTCUTS
                .iter()
                .find(|(short, _)| *short == token)
                .map_or(token, |(_, long)| *long)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Reads one answer per window from standard input.
pub struct HumanAgent {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
    notices: NoticeQueue,
}

impl HumanAgent {
    /// Agent reading from this process's stdin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            out: tokio::io::stdout(),
            notices: NoticeQueue::default(),
        }
    }

    async fn say(out: &mut (impl AsyncWrite + Unpin), text: &str) -> Result<()> {
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

impl Default for HumanAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionAgent for HumanAgent {
    fn display_name(&self) -> &str {
        "Human"
    }

    fn identity(&self) -> &str {
        "human"
    }

    fn start_episode<'a>(
        &'a mut self,
        _briefing: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.notices.clear();
            Ok("Understood.".to_owned())
        })
    }

    fn propose_input<'a>(
        &'a mut self,
        progress: &'a str,
        image_path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let notices = self.notices.drain_text();
            let prompt = format!(
                "{notices}Progress: {progress}\nFrames: {}\nEnter an input sequence: ",
                image_path.display()
            );
            Self::say(&mut self.out, &prompt).await?;

            let line = self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| AppError::Agent("stdin closed".into()))?;
            Ok(expand_shortcuts(line.trim()))
        })
    }

    fn set_context_notice(&mut self, notice: &str) {
        self.notices.push(notice);
    }
}
