use crate::types::contact::ContactRecord;
use crate::types::group::GroupRecord;
use crate::types::jid::Jid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A single text message delivered live by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub chat: Jid,
    pub sender: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One entry of a history-sync batch. Any field may be missing in the
/// upstream data; entries without a sender or body are dropped on append.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HistoryMessage {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            body: Some(body.into()),
            timestamp: None,
        }
    }
}

/// Past messages of one chat, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySyncBatch {
    pub chat: Jid,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Message(MessageEvent),
    HistorySync(HistorySyncBatch),
    ContactUpdate(ContactRecord),
    JoinedGroup(GroupRecord),
}

impl SessionEvent {
    /// The chat this event touches.
    pub fn chat(&self) -> &Jid {
        match self {
            SessionEvent::Message(msg) => &msg.chat,
            SessionEvent::HistorySync(batch) => &batch.chat,
            SessionEvent::ContactUpdate(contact) => &contact.jid,
            SessionEvent::JoinedGroup(group) => &group.jid,
        }
    }
}

pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &SessionEvent);
}

/// Fans every session event out to the registered handlers, in registration
/// order.
#[derive(Default, Clone)]
pub struct CoreEventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl CoreEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&self, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .expect("RwLock should not be poisoned")
            .push(handler);
    }

    pub fn has_handlers(&self) -> bool {
        !self
            .handlers
            .read()
            .expect("RwLock should not be poisoned")
            .is_empty()
    }

    /// Handlers run without the registry lock held, so a handler may register
    /// further handlers. Those see the next event, not this one.
    pub fn dispatch(&self, event: &SessionEvent) {
        let handlers = self
            .handlers
            .read()
            .expect("RwLock should not be poisoned")
            .clone();
        for handler in handlers {
            handler.handle_event(event);
        }
    }
}
