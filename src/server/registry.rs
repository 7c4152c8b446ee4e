//! Participant registry
//!
//! The registry is the only piece of state shared between connection
//! handlers and dispatch workers. All access goes through its synchronized
//! operations; no caller ever holds the underlying collection, and the
//! registry itself performs no I/O.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::protocol::Lexicon;
use crate::server::connection::ConnectionWriter;

/// A registered, connected chat user.
///
/// Constructed only once the nickname is known and the writer is ready, so
/// a snapshot never observes a participant mid-construction. Nicknames are
/// not unique; identity is the generated id.
pub struct Participant {
    id: Uuid,
    nickname: String,
    writer: ConnectionWriter,
}

impl Participant {
    pub fn new(nickname: String, writer: ConnectionWriter) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname,
            writer,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn writer(&self) -> &ConnectionWriter {
        &self.writer
    }
}

/// Insertion-ordered collection of live participants.
///
/// Mutated concurrently by every connection handler and read concurrently by
/// dispatch workers. A snapshot is consistent with some point-in-time
/// membership; it is not guaranteed to reflect a concurrent mutation.
pub struct Registry {
    participants: Mutex<Vec<Arc<Participant>>>,
    lexicon: Lexicon,
}

impl Registry {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            participants: Mutex::new(Vec::new()),
            lexicon,
        }
    }

    /// The string set user-facing replies are built from
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Insert a participant at the end of the registry order
    pub fn add(&self, participant: Arc<Participant>) {
        self.participants.lock().push(participant);
    }

    /// Remove a participant by id.
    ///
    /// Idempotent: removing an absent participant is a no-op. Returns
    /// whether an entry was actually removed.
    pub fn remove(&self, id: &Uuid) -> bool {
        let mut participants = self.participants.lock();
        let before = participants.len();
        participants.retain(|p| p.id() != *id);
        participants.len() != before
    }

    /// Point-in-time ordered copy of the membership, for iteration without
    /// holding the lock across I/O
    pub fn snapshot(&self) -> Vec<Arc<Participant>> {
        self.participants.lock().clone()
    }

    /// Format the connected-user list in registry order
    pub fn format_user_list(&self) -> String {
        let participants = self.participants.lock();
        if participants.is_empty() {
            return self.lexicon.no_users.to_string();
        }
        let mut list = String::from(self.lexicon.user_list_header);
        for participant in participants.iter() {
            list.push_str("\n- ");
            list.push_str(participant.nickname());
        }
        list
    }

    pub fn len(&self) -> usize {
        self.participants.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.lock().is_empty()
    }
}
