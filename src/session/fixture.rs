use crate::session::SessionAdapter;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use wacore::types::events::{HistorySyncBatch, MessageEvent, SessionEvent};
use wacore::types::{ContactRecord, GroupRecord, Jid};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// A recorded session: the stores as they were at login, the history sync
/// that followed, and a script of live events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFixture {
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub history: Vec<HistorySyncBatch>,
    #[serde(default)]
    pub live: Vec<LiveStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStep {
    /// Pause before this event is delivered.
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(flatten)]
    pub event: LiveEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveEvent {
    Message {
        chat: Jid,
        sender: String,
        body: String,
    },
    Contact {
        contact: ContactRecord,
    },
    JoinedGroup {
        group: GroupRecord,
    },
}

impl LiveEvent {
    fn into_session_event(self) -> SessionEvent {
        match self {
            LiveEvent::Message { chat, sender, body } => SessionEvent::Message(MessageEvent {
                chat,
                sender,
                body,
                timestamp: Some(Utc::now()),
            }),
            LiveEvent::Contact { contact } => SessionEvent::ContactUpdate(contact),
            LiveEvent::JoinedGroup { group } => SessionEvent::JoinedGroup(group),
        }
    }
}

/// A [`SessionAdapter`] that replays a [`SessionFixture`].
pub struct FixtureSession {
    fixture: SessionFixture,
    started: AtomicBool,
}

impl FixtureSession {
    pub fn new(fixture: SessionFixture) -> Self {
        Self {
            fixture,
            started: AtomicBool::new(false),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading session fixture {}", path.display()))?;
        let session = Self::from_json(&raw)
            .with_context(|| format!("parsing session fixture {}", path.display()))?;
        info!(
            "Loaded session fixture {}: {} contacts, {} groups, {} history batches, {} live events",
            path.display(),
            session.fixture.contacts.len(),
            session.fixture.groups.len(),
            session.fixture.history.len(),
            session.fixture.live.len()
        );
        Ok(session)
    }

    pub fn from_json(raw: &str) -> Result<Self, anyhow::Error> {
        let fixture: SessionFixture = serde_json::from_str(raw)?;
        Ok(Self::new(fixture))
    }

    pub fn fixture(&self) -> &SessionFixture {
        &self.fixture
    }
}

#[async_trait]
impl SessionAdapter for FixtureSession {
    async fn list_contacts(&self) -> Result<Vec<ContactRecord>, anyhow::Error> {
        Ok(self.fixture.contacts.clone())
    }

    async fn list_joined_groups(&self) -> Result<Vec<GroupRecord>, anyhow::Error> {
        Ok(self.fixture.groups.clone())
    }

    async fn events(&self) -> Result<mpsc::Receiver<SessionEvent>, anyhow::Error> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(anyhow!("session events are already being consumed"));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let history = self.fixture.history.clone();
        let live = self.fixture.live.clone();

        tokio::spawn(async move {
            for batch in history {
                debug!("Replaying history sync for {}", batch.chat);
                if tx.send(SessionEvent::HistorySync(batch)).await.is_err() {
                    return;
                }
            }
            for step in live {
                if step.delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
                }
                if tx.send(step.event.into_session_event()).await.is_err() {
                    warn!("Event receiver dropped, stopping fixture replay");
                    return;
                }
            }
            debug!("Fixture replay finished");
        });

        Ok(rx)
    }
}
