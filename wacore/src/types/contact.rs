use crate::types::jid::Jid;
use serde::{Deserialize, Serialize};

/// A contact as reported by the session's contact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub jid: Jid,
    /// The name the contact chose for themselves.
    #[serde(default)]
    pub push_name: String,
    /// The name saved in the address book, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl ContactRecord {
    pub fn new(jid: Jid, push_name: impl Into<String>) -> Self {
        Self {
            jid,
            push_name: push_name.into(),
            full_name: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Full name, then push name, then the JID itself. Blank names are skipped.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| Some(self.push_name.as_str()).filter(|name| !name.trim().is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| self.jid.to_string())
    }
}
