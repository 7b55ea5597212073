pub mod contact;
pub mod events;
pub mod group;
pub mod jid;
pub mod snapshot;

pub use contact::ContactRecord;
pub use group::{GroupParticipant, GroupRecord};
pub use jid::Jid;
pub use snapshot::Snapshot;
