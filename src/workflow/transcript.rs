// src/workflow/transcript.rs
use crate::models::job::{Message, Sender};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const INITIAL_ENTRY_ID: &str = "initial";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// False while shown optimistically and not yet echoed back by the server
    pub confirmed: bool,
    seq: u64,
}

/// Conversation as displayed: ordered by timestamp (insertion order breaks
/// ties), never holding two entries for the same server message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
    next_seq: u64,
    initial_seeded: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ai_count(&self) -> usize {
        self.entries.iter().filter(|e| e.sender == Sender::Ai).count()
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    /// Seed the first AI answer. Repeated calls are no-ops.
    pub fn seed_initial(&mut self, content: &str) -> bool {
        if self.initial_seeded {
            return false;
        }
        self.initial_seeded = true;
        self.insert(INITIAL_ENTRY_ID.to_string(), Sender::Ai, content, Utc::now(), false);
        true
    }

    /// Optimistically show a message before the server has it.
    pub fn push_local(&mut self, sender: Sender, content: &str) -> String {
        self.push_local_at(sender, content, Utc::now())
    }

    pub fn push_local_at(&mut self, sender: Sender, content: &str, at: DateTime<Utc>) -> String {
        let id = format!("local-{}", Uuid::new_v4());
        self.insert(id.clone(), sender, content, at, false);
        id
    }

    /// A client-side note (e.g. a failed reply) that the server will never echo.
    pub fn push_notice(&mut self, content: &str) -> String {
        let id = format!("notice-{}", Uuid::new_v4());
        self.insert(id.clone(), Sender::Ai, content, Utc::now(), true);
        id
    }

    /// Fold server messages in. Known ids are skipped; a message matching a
    /// unconfirmed entry (same sender and text) confirms it instead of adding a
    /// second copy. Returns how many entries were added.
    pub fn merge_server(&mut self, messages: &[Message]) -> usize {
        let mut added = 0;
        for message in messages {
            if self.entries.iter().any(|e| e.id == message.id) {
                continue;
            }

            let unconfirmed = self
                .entries
                .iter_mut()
                .filter(|e| !e.confirmed && e.sender == message.sender && e.content == message.content)
                .min_by_key(|e| e.seq);

            match unconfirmed {
                Some(entry) => {
                    entry.id = message.id.clone();
                    entry.timestamp = message.created_at;
                    entry.confirmed = true;
                }
                None => {
                    self.insert(
                        message.id.clone(),
                        message.sender,
                        &message.content,
                        message.created_at,
                        true,
                    );
                    added += 1;
                }
            }
        }
        self.sort();
        added
    }

    fn insert(&mut self, id: String, sender: Sender, content: &str, at: DateTime<Utc>, confirmed: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(ChatEntry {
            id,
            sender,
            content: content.to_string(),
            timestamp: at,
            confirmed,
            seq,
        });
        self.sort();
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| (e.timestamp, e.seq));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn server(id: &str, sender: Sender, content: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: id.to_string(),
            job_id: "job-1".to_string(),
            sender,
            content: content.to_string(),
            created_at: at,
        }
    }

    #[test]
    fn optimistic_message_is_confirmed_not_duplicated() {
        let mut transcript = Transcript::new();
        let local_id = transcript.push_local(Sender::User, "What happens at 0:30?");
        assert_eq!(transcript.len(), 1);
        assert!(!transcript.entries()[0].confirmed);

        let at = Utc::now();
        let history = vec![
            server("m1", Sender::User, "What happens at 0:30?", at),
            server("m2", Sender::Ai, "A dog jumps.", at + Duration::seconds(2)),
        ];
        assert_eq!(transcript.merge_server(&history), 1);
        assert_eq!(transcript.len(), 2);
        assert!(transcript.entries().iter().all(|e| e.id != local_id));
        assert!(transcript.entries().iter().all(|e| e.confirmed));

        // Same history again: nothing changes
        assert_eq!(transcript.merge_server(&history), 0);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn initial_seed_happens_once() {
        let mut transcript = Transcript::new();
        assert!(transcript.seed_initial("Here is the analysis."));
        assert!(!transcript.seed_initial("Here is the analysis."));
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.entries()[0].id, INITIAL_ENTRY_ID);
    }

    #[test]
    fn initial_answer_is_confirmed_by_history() {
        let mut transcript = Transcript::new();
        transcript.seed_initial("Summary");
        transcript.merge_server(&[server("42", Sender::Ai, "Summary", Utc::now())]);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.entries()[0].id, "42");
        // Seeding after confirmation is still a no-op
        transcript.seed_initial("Summary");
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn display_order_follows_timestamps() {
        let mut transcript = Transcript::new();
        let base = Utc::now();
        transcript.merge_server(&[
            server("b", Sender::Ai, "second", base + Duration::seconds(5)),
            server("a", Sender::User, "first", base),
        ]);
        transcript.push_local_at(Sender::User, "third", base + Duration::seconds(10));
        let contents: Vec<&str> = transcript.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let mut transcript = Transcript::new();
        let at = Utc::now();
        transcript.push_local_at(Sender::User, "question", at);
        transcript.push_local_at(Sender::Ai, "answer", at);
        assert_eq!(transcript.entries()[0].content, "question");
        assert_eq!(transcript.entries()[1].content, "answer");
    }

    #[test]
    fn notices_are_never_confirmed_away() {
        let mut transcript = Transcript::new();
        transcript.push_notice("Sorry, something broke");
        transcript.merge_server(&[server("x", Sender::Ai, "Sorry, something broke", Utc::now())]);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.ai_count(), 2);
    }
}
