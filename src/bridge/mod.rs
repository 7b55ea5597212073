//! TCP handoff of the contact and group snapshot from the producer (the
//! process that owns the WhatsApp session) to a consumer (the browser).
//!
//! The stream is a sequence of `<Tag>\\<json>\n` frames terminated by `End`.
//! A producer serves a single consumer and then stops listening.

pub mod client;
pub mod error;
pub mod server;

pub use client::{BridgeClient, ReceivedSnapshot, SnapshotReader};
pub use error::BridgeError;
pub use server::{BridgeConnection, BridgeServer, SnapshotStats, SnapshotWriter};
