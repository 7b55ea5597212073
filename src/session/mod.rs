//! The seam between the bridge and whatever owns the WhatsApp session.
//!
//! Pairing, encryption and the store live behind [`SessionAdapter`]; this
//! crate only needs contacts, joined groups and a stream of events.

pub mod fixture;

pub use fixture::{FixtureSession, LiveEvent, LiveStep, SessionFixture};

use crate::error::AppError;
use async_trait::async_trait;
use log::info;
use tokio::sync::mpsc;
use wacore::types::events::SessionEvent;
use wacore::types::{ContactRecord, GroupRecord, Snapshot};

#[async_trait]
pub trait SessionAdapter: Send + Sync {
    async fn list_contacts(&self) -> Result<Vec<ContactRecord>, anyhow::Error>;

    async fn list_joined_groups(&self) -> Result<Vec<GroupRecord>, anyhow::Error>;

    /// Starts the event stream. Sessions deliver events to a single
    /// subscriber, so calling this twice is an error.
    async fn events(&self) -> Result<mpsc::Receiver<SessionEvent>, anyhow::Error>;
}

/// Groups are fetched before contacts; the first failure aborts.
pub async fn fetch_snapshot(session: &dyn SessionAdapter) -> Result<Snapshot, AppError> {
    let groups = session
        .list_joined_groups()
        .await
        .map_err(AppError::GroupFetch)?;
    let contacts = session
        .list_contacts()
        .await
        .map_err(AppError::ContactFetch)?;

    info!(
        "Fetched {} contacts and {} joined groups",
        contacts.len(),
        groups.len()
    );
    Ok(Snapshot::new(contacts, groups))
}
