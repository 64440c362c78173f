//! Bounded rolling conversation memory.
//!
//! Holds the recent raw turns of a session plus a compacted "moving summary".
//! The summary covers a prefix of the raw buffer (the compaction watermark);
//! only covered turns are ever pruned, so nothing the summary has not yet
//! absorbed is lost.

use std::collections::VecDeque;

use crate::prompts::compaction_prompt;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::types::Message;

pub const DEFAULT_TOKEN_LIMIT: usize = 1000;
pub const DEFAULT_RETAINED_TURNS: usize = 10;

/// Rough token estimate (four characters per token).
pub fn estimate_text_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.chars().count().div_ceil(4)
}

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

impl Turn {
    fn estimated_tokens(&self) -> usize {
        estimate_text_tokens(&self.user) + estimate_text_tokens(&self.assistant)
    }
}

/// Result of a compaction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// Nothing new to fold in; the summary is as it was.
    Unchanged,
    /// The summary was replaced with this text.
    Updated(String),
    /// Summarization failed; the previous summary is retained.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SummarizingMemory {
    turns: VecDeque<Turn>,
    /// Number of leading turns already reflected in `summary`.
    covered: usize,
    summary: String,
    token_limit: usize,
    retained_turns: usize,
}

impl Default for SummarizingMemory {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LIMIT, DEFAULT_RETAINED_TURNS)
    }
}

impl SummarizingMemory {
    pub fn new(token_limit: usize, retained_turns: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            covered: 0,
            summary: String::new(),
            token_limit,
            retained_turns,
        }
    }

    /// Record a completed turn.
    pub fn append(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push_back(Turn {
            user: user.into(),
            assistant: assistant.into(),
        });
    }

    /// The current moving summary, if any.
    pub fn moving_summary(&self) -> Option<&str> {
        if self.summary.is_empty() {
            None
        } else {
            Some(&self.summary)
        }
    }

    /// Adopt a remotely stored summary when this memory holds none.
    ///
    /// Returns whether the summary was adopted.
    pub fn hydrate_summary(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || !self.summary.is_empty() {
            return false;
        }
        self.summary = text.to_string();
        true
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns not yet folded into the summary.
    pub fn uncovered_len(&self) -> usize {
        self.turns.len() - self.covered
    }

    /// Estimated tokens held: the summary plus every retained turn.
    pub fn estimated_tokens(&self) -> usize {
        estimate_text_tokens(&self.summary)
            + self.turns.iter().map(Turn::estimated_tokens).sum::<usize>()
    }

    /// Retained turns as alternating user/assistant messages.
    pub fn context_messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|turn| [Message::user(&turn.user), Message::assistant(&turn.assistant)])
            .collect()
    }

    fn new_lines(&self) -> String {
        self.turns
            .iter()
            .skip(self.covered)
            .map(|turn| format!("Human: {}\nAI: {}", turn.user, turn.assistant))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Fold uncovered turns into the moving summary.
    pub async fn compact(&mut self, provider: &dyn ModelProvider) -> CompactionOutcome {
        if self.uncovered_len() == 0 {
            return CompactionOutcome::Unchanged;
        }

        let prompt = compaction_prompt(&self.summary, &self.new_lines());
        let request = ProviderRequest::new(vec![Message::user(prompt)]);
        let response = match provider.generate_text(&request).await {
            Ok(response) => response,
            Err(error) => return CompactionOutcome::Failed(error.to_string()),
        };

        let next = response.text.trim();
        if next.is_empty() {
            return CompactionOutcome::Failed("summarizer returned empty text".to_string());
        }

        self.summary = next.to_string();
        self.covered = self.turns.len();
        self.prune();
        CompactionOutcome::Updated(self.summary.clone())
    }

    /// Drop covered turns while over the turn bound or the token budget.
    fn prune(&mut self) {
        while self.covered > 0
            && (self.turns.len() > self.retained_turns || self.estimated_tokens() > self.token_limit)
        {
            self.turns.pop_front();
            self.covered -= 1;
        }
    }
}
