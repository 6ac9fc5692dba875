//! Short conversational memory
//!
//! Keeps the last few (instruction, action, result) triples and renders the
//! most recent ones into the text block every prompt receives.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::action::ActionSpec;

/// Maximum number of remembered entries
pub const MEMORY_CAPACITY: usize = 5;
/// Number of entries rendered into the prompt context
pub const CONTEXT_ENTRIES: usize = 3;
/// Results are cut to this many characters in the context
pub const RESULT_PREVIEW_CHARS: usize = 100;
/// Context text when nothing has happened yet
pub const NO_CONTEXT: &str = "No previous context";

/// One remembered instruction and its outcome
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub instruction: String,
    /// Absent when planning itself failed
    pub action: Option<ActionSpec>,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

impl MemoryEntry {
    fn render(&self) -> String {
        let action = self
            .action
            .as_ref()
            .map(ActionSpec::summary)
            .unwrap_or_else(|| "none()".to_string());
        format!(
            "\"{}\" -> {} -> {}",
            self.instruction,
            action,
            truncate_chars(&self.result, RESULT_PREVIEW_CHARS)
        )
    }
}

/// Bounded FIFO of recent entries
#[derive(Debug, Default)]
pub struct Memory {
    entries: VecDeque<MemoryEntry>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, evicting the oldest past capacity
    pub fn add(
        &mut self,
        instruction: impl Into<String>,
        action: Option<ActionSpec>,
        result: impl Into<String>,
    ) {
        self.entries.push_back(MemoryEntry {
            instruction: instruction.into(),
            action,
            result: result.into(),
            timestamp: Utc::now(),
        });
        while self.entries.len() > MEMORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Render the most recent entries for a prompt
    pub fn context(&self) -> String {
        if self.entries.is_empty() {
            return NO_CONTEXT.to_string();
        }

        let skip = self.entries.len().saturating_sub(CONTEXT_ENTRIES);
        self.entries
            .iter()
            .skip(skip)
            .map(MemoryEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn last_entry(&self) -> Option<&MemoryEntry> {
        self.entries.back()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Cut `text` to at most `max` characters, marking the cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
