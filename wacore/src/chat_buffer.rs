use crate::types::events::{EventHandler, HistoryMessage, MessageEvent, SessionEvent};
use crate::types::jid::Jid;
use chrono::{DateTime, Local, Utc};
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, TryLockError};

const TIMESTAMP_FORMAT: &str = "%H:%M";

/// One rendered transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub timestamp: Option<String>,
    pub sender: String,
    pub body: String,
}

impl ChatLine {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            sender: sender.into(),
            body: body.into(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp_label(timestamp));
        self
    }

    /// Builds a line from a history entry, or `None` when the sender or the
    /// body is missing or blank.
    pub fn from_history(message: &HistoryMessage) -> Option<Self> {
        let sender = message.sender.as_deref().filter(|s| !s.trim().is_empty())?;
        let body = message.body.as_deref().filter(|b| !b.trim().is_empty())?;
        let line = ChatLine::new(sender, body);
        Some(match message.timestamp {
            Some(ts) => line.at(ts),
            None => line,
        })
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ts) = &self.timestamp {
            write!(f, "[{ts}] ")?;
        }
        write!(f, "{}: {}", self.sender, self.body)
    }
}

fn timestamp_label(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Append-only transcripts for every chat seen so far.
///
/// A single lock guards the whole map. Writers are the session event path,
/// readers are the renderer; the renderer should go through [`try_lines`] so
/// it never waits on a writer.
///
/// Buffers are never evicted and grow for as long as the process runs.
///
/// [`try_lines`]: ChatBufferStore::try_lines
#[derive(Debug, Default)]
pub struct ChatBufferStore {
    chats: RwLock<HashMap<Jid, Vec<ChatLine>>>,
}

impl ChatBufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_line(&self, chat: &Jid, line: ChatLine) {
        let mut chats = self.chats.write().expect("RwLock should not be poisoned");
        chats.entry(chat.clone()).or_default().push(line);
    }

    /// Appends a history batch in order, skipping entries that cannot be
    /// rendered. Returns how many lines were appended.
    pub fn append_history_batch<'a, I>(&self, chat: &Jid, messages: I) -> usize
    where
        I: IntoIterator<Item = &'a HistoryMessage>,
    {
        let mut skipped = 0usize;
        let lines: Vec<ChatLine> = messages
            .into_iter()
            .filter_map(|message| {
                let line = ChatLine::from_history(message);
                if line.is_none() {
                    skipped += 1;
                }
                line
            })
            .collect();

        if skipped > 0 {
            trace!("Skipped {skipped} unusable history entries for {chat}");
        }

        let appended = lines.len();
        let mut chats = self.chats.write().expect("RwLock should not be poisoned");
        chats.entry(chat.clone()).or_default().extend(lines);
        appended
    }

    /// Copy of the transcript for `chat`; empty when nothing was received yet.
    pub fn lines(&self, chat: &Jid) -> Vec<ChatLine> {
        self.chats
            .read()
            .expect("RwLock should not be poisoned")
            .get(chat)
            .cloned()
            .unwrap_or_default()
    }

    /// Like [`lines`](Self::lines) but returns `None` instead of waiting when a
    /// writer holds the lock.
    pub fn try_lines(&self, chat: &Jid) -> Option<Vec<ChatLine>> {
        let chats = match self.chats.try_read() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return None,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        Some(chats.get(chat).cloned().unwrap_or_default())
    }

    /// Non-blocking read of the lines at index `start` and after. Transcripts
    /// only grow, so a reader holding the first `start` lines can append these.
    pub fn try_lines_from(&self, chat: &Jid, start: usize) -> Option<Vec<ChatLine>> {
        let chats = match self.chats.try_read() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return None,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        let lines = chats.get(chat).map_or(&[][..], Vec::as_slice);
        Some(lines.get(start..).unwrap_or_default().to_vec())
    }

    pub fn len(&self, chat: &Jid) -> usize {
        self.chats
            .read()
            .expect("RwLock should not be poisoned")
            .get(chat)
            .map_or(0, Vec::len)
    }

    pub fn chat_count(&self) -> usize {
        self.chats
            .read()
            .expect("RwLock should not be poisoned")
            .len()
    }

    pub fn on_message_event(
        &self,
        sender: &str,
        body: &str,
        chat: &Jid,
        timestamp: Option<DateTime<Utc>>,
    ) {
        let line = ChatLine::new(sender, body);
        let line = match timestamp {
            Some(ts) => line.at(ts),
            None => line,
        };
        self.append_line(chat, line);
    }

    pub fn on_history_sync_batch(&self, chat: &Jid, messages: &[HistoryMessage]) -> usize {
        let appended = self.append_history_batch(chat, messages);
        debug!(
            "History sync for {chat}: appended {appended} of {} messages",
            messages.len()
        );
        appended
    }
}

impl EventHandler for ChatBufferStore {
    fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Message(MessageEvent {
                chat,
                sender,
                body,
                timestamp,
            }) => self.on_message_event(sender, body, chat, *timestamp),
            SessionEvent::HistorySync(batch) => {
                self.on_history_sync_batch(&batch.chat, &batch.messages);
            }
            SessionEvent::ContactUpdate(_) | SessionEvent::JoinedGroup(_) => {}
        }
    }
}
