use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use wacore::browser::{BrowserMsg, BrowserViewModel};
use wacore::chat_buffer::ChatBufferStore;
use wacore::chat_list::ChatDirectory;
use wacore::types::Jid;
use wacore::types::events::CoreEventBus;
use whatsapp_tui::error::{AppError, ExitStatus};
use whatsapp_tui::events::{BrowserForwarder, spawn_event_pump};
use whatsapp_tui::session::{FixtureSession, SessionAdapter, fetch_snapshot};

const FIXTURE: &str = r#"{
    "contacts": [
        {"jid": "5511999990001@s.whatsapp.net", "push_name": "Ana"},
        {"jid": "5511999990002@s.whatsapp.net", "push_name": "bia", "full_name": "Beatriz"}
    ],
    "groups": [
        {"jid": "120363@g.us", "name": "Família"}
    ],
    "history": [
        {"chat": "5511999990001@s.whatsapp.net", "messages": [
            {"sender": "Ana", "body": "oi", "timestamp": "2024-03-01T12:00:00Z"},
            {"sender": "Ana"},
            {"sender": "Ana", "body": "tudo bem?"},
            {"sender": "Você", "body": "tudo!"}
        ]}
    ],
    "live": [
        {"kind": "message", "chat": "5511999990001@s.whatsapp.net",
         "sender": "Ana", "body": "que bom"},
        {"kind": "joined_group",
         "group": {"jid": "120364@g.us", "name": "Trabalho"}}
    ]
}"#;

fn write_fixture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_and_fetch_snapshot() {
    let file = write_fixture(FIXTURE);
    let session = FixtureSession::load(file.path()).await.unwrap();

    let snapshot = fetch_snapshot(&session).await.unwrap();
    assert_eq!(snapshot.contacts.len(), 2);
    assert_eq!(snapshot.groups.len(), 1);

    let directory = ChatDirectory::from_snapshot(snapshot);
    let names: Vec<&str> = directory.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Beatriz", "Família"]);
}

#[tokio::test]
async fn test_missing_fixture_is_session_init_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FixtureSession::load(dir.path().join("nope.json"))
        .await
        .map_err(AppError::SessionInit)
        .err()
        .unwrap();
    assert_eq!(err.exit_status(), ExitStatus::SessionInit);
}

#[tokio::test]
async fn test_invalid_fixture_is_rejected() {
    let file = write_fixture(r#"{"contacts": [{"push_name": "no jid"}]}"#);
    assert!(FixtureSession::load(file.path()).await.is_err());
}

#[tokio::test]
async fn test_events_fill_store_and_wake_browser() {
    let session = FixtureSession::from_json(FIXTURE).unwrap();
    let snapshot = fetch_snapshot(&session).await.unwrap();

    let store = Arc::new(ChatBufferStore::new());
    let (forwarder, mut updates) = BrowserForwarder::channel();
    let bus = Arc::new(CoreEventBus::new());
    bus.add_handler(store.clone());
    bus.add_handler(Arc::new(forwarder));

    let pump = spawn_event_pump(session.events().await.unwrap(), bus);
    assert_eq!(pump.await.unwrap(), 3);

    let ana = Jid::user("5511999990001");
    let lines = store.lines(&ana);
    let bodies: Vec<&str> = lines.iter().map(|l| l.body.as_str()).collect();
    assert_eq!(bodies, vec!["oi", "tudo bem?", "tudo!", "que bom"]);
    assert!(lines[0].timestamp.is_some());
    assert!(lines[1].timestamp.is_none());

    let mut model = BrowserViewModel::new(ChatDirectory::from_snapshot(snapshot), store);
    model.update(BrowserMsg::Resize {
        width: 80,
        height: 24,
    });
    while let Some(msg) = updates.try_recv() {
        model.update(msg);
    }

    assert_eq!(model.directory().len(), 4);
    assert_eq!(model.selected().unwrap().jid, ana);
    assert_eq!(model.transcript().len(), 4);
}

#[tokio::test]
async fn test_events_can_only_be_taken_once() {
    let session = FixtureSession::from_json("{}").unwrap();
    let _events = session.events().await.unwrap();
    assert!(session.events().await.is_err());
}
