use crate::types::jid::Jid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupParticipant {
    pub jid: Jid,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_super_admin: bool,
}

/// A group the account has joined. Membership data is carried along for the
/// consumer but nothing in this crate interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupRecord {
    pub jid: Jid,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Jid>,
    #[serde(default)]
    pub participants: Vec<GroupParticipant>,
}

impl GroupRecord {
    pub fn new(jid: Jid, name: impl Into<String>) -> Self {
        Self {
            jid,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.jid.to_string()
        } else {
            self.name.clone()
        }
    }

    pub fn admins(&self) -> impl Iterator<Item = &GroupParticipant> {
        self.participants
            .iter()
            .filter(|p| p.is_admin || p.is_super_admin)
    }
}
