//! UI-agnostic transcript state
//!
//! These types are shared by every front-end and don't depend on any
//! specific UI framework. The transcript is append-only; the one entry that
//! can be removed is a pending placeholder.

use chrono::{DateTime, Local};

use crate::annotation::Annotation;
use crate::markup::RichText;

/// Who a transcript message is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    SystemError,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "AI Assistant",
            ChatRole::SystemError => "System",
        }
    }
}

/// A committed transcript message
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub rich: RichText,
    pub timestamp: DateTime<Local>,
    pub annotation: Option<Annotation>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>, markdown: bool) -> Self {
        let content = content.into();
        let rich = if markdown {
            RichText::parse(&content)
        } else {
            RichText::plain(&content)
        };
        Self {
            role,
            content,
            rich,
            timestamp: Local::now(),
            annotation: None,
        }
    }

    pub fn user(content: impl Into<String>, markdown: bool) -> Self {
        Self::new(ChatRole::User, content, markdown)
    }

    pub fn assistant(content: impl Into<String>, markdown: bool) -> Self {
        Self::new(ChatRole::Assistant, content, markdown)
    }

    /// Error entries never interpret markup.
    pub fn system_error(content: impl Into<String>) -> Self {
        Self::new(ChatRole::SystemError, content, false)
    }

    /// e.g. "3:07 PM"
    pub fn display_time(&self) -> String {
        self.timestamp.format("%-I:%M %p").to_string()
    }

    /// e.g. "You • 3:07 PM"
    pub fn byline(&self) -> String {
        format!("{} • {}", self.role.label(), self.display_time())
    }
}

/// Handle to a pending placeholder, owned by the request that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

#[derive(Debug, Clone)]
pub enum Entry {
    Message(ChatMessage),
    Pending(PendingId),
}

impl Entry {
    pub fn as_message(&self) -> Option<&ChatMessage> {
        match self {
            Entry::Message(m) => Some(m),
            Entry::Pending(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Vec<Entry>,
    empty_state: bool,
    next_pending: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// A fresh transcript showing its empty-state marker.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            empty_state: true,
            next_pending: 0,
        }
    }

    /// Transcript seeded with earlier messages (e.g. server-rendered history).
    pub fn with_history(history: Vec<ChatMessage>) -> Self {
        let empty_state = history.is_empty();
        Self {
            entries: history.into_iter().map(Entry::Message).collect(),
            empty_state,
            next_pending: 0,
        }
    }

    /// Commit a message. Clears the empty-state marker.
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(Entry::Message(message));
        self.empty_state = false;
    }

    /// Append a placeholder and hand back its handle.
    pub fn begin_pending(&mut self) -> PendingId {
        let id = PendingId(self.next_pending);
        self.next_pending += 1;
        self.entries.push(Entry::Pending(id));
        id
    }

    /// Remove the placeholder `id`. Returns false if it was already gone.
    pub fn remove_pending(&mut self, id: PendingId) -> bool {
        match self
            .entries
            .iter()
            .position(|e| matches!(e, Entry::Pending(p) if *p == id))
        {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter_map(Entry::as_message)
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.entries.iter().rev().find_map(Entry::as_message)
    }

    /// Number of entries, placeholders included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Pending(_)))
            .count()
    }

    pub fn count_role(&self, role: ChatRole) -> usize {
        self.messages().filter(|m| m.role == role).count()
    }

    pub fn shows_empty_state(&self) -> bool {
        self.empty_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transcript_shows_empty_state() {
        let transcript = Transcript::new();
        assert!(transcript.shows_empty_state());
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_push_clears_empty_state() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("hi", true));
        assert!(!transcript.shows_empty_state());
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_history_suppresses_empty_state() {
        let transcript = Transcript::with_history(vec![ChatMessage::assistant("earlier", true)]);
        assert!(!transcript.shows_empty_state());
        assert_eq!(transcript.count_role(ChatRole::Assistant), 1);
    }

    #[test]
    fn test_pending_removed_once() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("hi", true));
        let pending = transcript.begin_pending();
        assert_eq!(transcript.pending_count(), 1);

        assert!(transcript.remove_pending(pending));
        assert!(!transcript.remove_pending(pending));
        assert_eq!(transcript.pending_count(), 0);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_remove_pending_targets_its_own_entry() {
        let mut transcript = Transcript::new();
        let first = transcript.begin_pending();
        let second = transcript.begin_pending();
        assert_ne!(first, second);

        transcript.remove_pending(second);
        assert!(matches!(transcript.entries(), [Entry::Pending(p)] if *p == first));
    }

    #[test]
    fn test_system_error_is_never_markup() {
        let msg = ChatMessage::system_error("**boom**");
        assert_eq!(msg.rich.to_html(), "**boom**");
        assert!(msg.byline().starts_with("System • "));
    }

    #[test]
    fn test_last_message_skips_pending() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("question", true));
        transcript.begin_pending();
        assert_eq!(transcript.last_message().map(|m| m.role), Some(ChatRole::User));
    }
}
