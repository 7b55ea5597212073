use crate::types::contact::ContactRecord;
use crate::types::group::GroupRecord;

/// Contacts and groups as they stood when the bridge handed them over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub contacts: Vec<ContactRecord>,
    pub groups: Vec<GroupRecord>,
}

impl Snapshot {
    pub fn new(contacts: Vec<ContactRecord>, groups: Vec<GroupRecord>) -> Self {
        Self { contacts, groups }
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.groups.is_empty()
    }
}
