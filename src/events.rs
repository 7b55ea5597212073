use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wacore::browser::BrowserMsg;
use wacore::types::events::{CoreEventBus, EventHandler, SessionEvent};

/// Logs what the session delivers. This is all the producer does with live
/// events once the snapshot has been handed off.
pub struct MessageLogger;

impl EventHandler for MessageLogger {
    fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Message(msg) => {
                info!("Received a message from {} in {}", msg.sender, msg.chat);
            }
            SessionEvent::HistorySync(batch) => {
                info!(
                    "History sync for {}: {} messages",
                    batch.chat,
                    batch.messages.len()
                );
            }
            SessionEvent::ContactUpdate(contact) => {
                info!("Contact updated: {}", contact.jid);
            }
            SessionEvent::JoinedGroup(group) => {
                info!("Joined group {} ({})", group.display_name(), group.jid);
            }
        }
    }
}

/// Wakes the browser when something it shows may have changed.
pub struct BrowserForwarder {
    tx: mpsc::UnboundedSender<BrowserMsg>,
    tick_pending: Arc<AtomicBool>,
}

impl BrowserForwarder {
    /// At most one `Tick` is queued at a time. A burst of messages wakes the
    /// browser once, and the browser reads everything new in one pass.
    pub fn channel() -> (Self, BrowserUpdates) {
        let (tx, rx) = mpsc::unbounded_channel();
        let tick_pending = Arc::new(AtomicBool::new(false));
        let forwarder = Self {
            tx,
            tick_pending: tick_pending.clone(),
        };
        (forwarder, BrowserUpdates { rx, tick_pending })
    }
}

impl EventHandler for BrowserForwarder {
    fn handle_event(&self, event: &SessionEvent) {
        let msg = match event {
            SessionEvent::ContactUpdate(contact) => BrowserMsg::ContactUpdated(contact.clone()),
            SessionEvent::JoinedGroup(group) => BrowserMsg::GroupJoined(group.clone()),
            SessionEvent::Message(_) | SessionEvent::HistorySync(_) => {
                if self.tick_pending.swap(true, Ordering::AcqRel) {
                    return;
                }
                BrowserMsg::Tick
            }
        };
        // The browser may already have quit.
        let _ = self.tx.send(msg);
    }
}

/// Receiving half of [`BrowserForwarder::channel`].
pub struct BrowserUpdates {
    rx: mpsc::UnboundedReceiver<BrowserMsg>,
    tick_pending: Arc<AtomicBool>,
}

impl BrowserUpdates {
    pub async fn recv(&mut self) -> Option<BrowserMsg> {
        let msg = self.rx.recv().await?;
        Some(self.delivered(msg))
    }

    pub fn try_recv(&mut self) -> Option<BrowserMsg> {
        let msg = self.rx.try_recv().ok()?;
        Some(self.delivered(msg))
    }

    // Cleared before the browser reads the store, so a message stored after
    // this point queues a fresh tick.
    fn delivered(&self, msg: BrowserMsg) -> BrowserMsg {
        if matches!(msg, BrowserMsg::Tick) {
            self.tick_pending.store(false, Ordering::Release);
        }
        msg
    }
}

/// Drains `rx` into `bus` until the session closes the stream. Resolves to
/// the number of events dispatched.
pub fn spawn_event_pump(
    mut rx: mpsc::Receiver<SessionEvent>,
    bus: Arc<CoreEventBus>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut dispatched = 0;
        while let Some(event) = rx.recv().await {
            bus.dispatch(&event);
            dispatched += 1;
        }
        debug!("Session event stream closed after {dispatched} events");
        dispatched
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wacore::types::events::MessageEvent;
    use wacore::types::{ContactRecord, Jid};

    fn message(body: &str) -> SessionEvent {
        SessionEvent::Message(MessageEvent {
            chat: Jid::user("1"),
            sender: "Ana".into(),
            body: body.into(),
            timestamp: None,
        })
    }

    #[tokio::test]
    async fn test_forwarder_maps_events() {
        let (forwarder, mut updates) = BrowserForwarder::channel();

        forwarder.handle_event(&SessionEvent::ContactUpdate(ContactRecord::new(
            Jid::user("1"),
            "Ana",
        )));
        forwarder.handle_event(&message("oi"));

        assert!(matches!(updates.recv().await, Some(BrowserMsg::ContactUpdated(_))));
        assert!(matches!(updates.recv().await, Some(BrowserMsg::Tick)));
    }

    #[tokio::test]
    async fn test_message_burst_queues_one_tick() {
        let (forwarder, mut updates) = BrowserForwarder::channel();

        for i in 0..100 {
            forwarder.handle_event(&message(&i.to_string()));
        }
        assert!(matches!(updates.try_recv(), Some(BrowserMsg::Tick)));
        assert!(updates.try_recv().is_none());

        forwarder.handle_event(&message("depois"));
        assert!(matches!(updates.try_recv(), Some(BrowserMsg::Tick)));
        assert!(updates.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_forwarder_ignores_closed_browser() {
        let (forwarder, updates) = BrowserForwarder::channel();
        drop(updates);
        forwarder.handle_event(&SessionEvent::ContactUpdate(ContactRecord::new(
            Jid::user("1"),
            "Ana",
        )));
        forwarder.handle_event(&message("oi"));
    }

    #[tokio::test]
    async fn test_pump_counts_until_close() {
        let (tx, rx) = mpsc::channel(4);
        let bus = Arc::new(CoreEventBus::new());
        bus.add_handler(Arc::new(MessageLogger));
        let pump = spawn_event_pump(rx, bus);

        for i in 0..3 {
            tx.send(SessionEvent::ContactUpdate(ContactRecord::new(
                Jid::user(&i.to_string()),
                "x",
            )))
            .await
            .unwrap();
        }
        drop(tx);

        assert_eq!(pump.await.unwrap(), 3);
    }
}
