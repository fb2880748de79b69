use log::info;

use crate::models::chat::Message;

pub const HISTORY_CAP: usize = 5;
pub const SUGGESTION_CAP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
}

/// Bounded list of previously submitted queries, newest first, with an
/// active pointer for the entry the displayed conversation belongs to and a
/// staging slot for delayed commits.
#[derive(Debug, Default)]
pub struct QueryHistory {
    entries: Vec<String>,
    active: Option<String>,
    pending: Option<String>,
}

impl QueryHistory {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e == text)
    }

    fn stage(&mut self, text: &str) {
        self.pending = Some(text.to_string());
    }

    /// Commit a staged entry. No-op when the pending slot no longer holds
    /// this text (a newer submission restaged it first) or when the entry
    /// already exists.
    fn commit_pending(&mut self, text: &str) {
        if self.pending.as_deref() != Some(text) {
            return;
        }
        self.pending = None;
        if self.contains(text) {
            return;
        }
        self.entries.insert(0, text.to_string());
        self.entries.truncate(HISTORY_CAP);
    }
}

/// In-memory state of one conversation thread. Injectable; handlers own and
/// pass it around rather than reaching for a global.
#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    suggestions: Vec<String>,
    history: QueryHistory,
    latest_seq: u64,
    last_completed_seq: u64,
    in_flight: usize,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight == 0 {
            Phase::Idle
        } else {
            Phase::AwaitingResponse
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Start a new query cycle: drop any typing placeholder, append the user
    /// message, clear the suggestion list, and stage the history entry when
    /// this is a fresh top-level conversation. Returns the sequence tag for
    /// this submission and whether a history entry was staged.
    pub fn begin_query(&mut self, text: &str) -> (u64, bool) {
        self.messages.retain(|m| !m.is_typing());
        self.messages.push(Message::user(text));
        self.suggestions.clear();

        let staged = self.history.active.is_none() && !self.history.contains(text);
        if staged {
            self.history.stage(text);
        }
        self.history.active = Some(text.to_string());

        self.latest_seq += 1;
        self.in_flight += 1;
        (self.latest_seq, staged)
    }

    /// Insert the typing placeholder for a submission that is still the
    /// latest and unanswered. The message list never holds more than one.
    pub fn insert_typing(&mut self, seq: u64) {
        if seq != self.latest_seq || seq <= self.last_completed_seq {
            return;
        }
        if self.messages.iter().any(|m| m.is_typing()) {
            return;
        }
        self.messages.push(Message::Typing);
    }

    /// Finish a query cycle. Completions tagged with a superseded sequence
    /// number are discarded; a fresh one removes the typing placeholder and
    /// appends the bot message, which is returned.
    pub fn complete_query(&mut self, seq: u64, html: String) -> Option<Message> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if seq != self.latest_seq {
            info!("Discarding stale completion (seq {}, latest {})", seq, self.latest_seq);
            return None;
        }
        self.last_completed_seq = seq;
        self.messages.retain(|m| !m.is_typing());
        let message = Message::bot(html);
        self.messages.push(message.clone());
        Some(message)
    }

    /// Replace the suggestion list wholesale, capped at three entries.
    /// Results for superseded submissions are dropped.
    pub fn set_suggestions(&mut self, seq: u64, list: Vec<String>) {
        if seq != self.latest_seq {
            return;
        }
        self.suggestions = list;
        self.suggestions.truncate(SUGGESTION_CAP);
    }

    pub fn commit_pending_history(&mut self, text: &str) {
        self.history.commit_pending(text);
    }

    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.suggestions.clear();
        self.history.active = None;
    }

    /// Remove a history entry. Deleting the active entry also resets the
    /// thread; returns whether that happened.
    pub fn delete_history(&mut self, text: &str) -> bool {
        self.history.entries.retain(|e| e != text);
        if self.history.active.as_deref() == Some(text) {
            self.new_chat();
            return true;
        }
        false
    }
}
