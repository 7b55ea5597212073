use crate::types::contact::ContactRecord;
use crate::types::group::GroupRecord;
use crate::types::jid::Jid;
use crate::types::snapshot::Snapshot;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListEntry {
    pub jid: Jid,
    pub name: String,
}

impl ChatListEntry {
    pub fn is_group(&self) -> bool {
        self.jid.is_group()
    }
}

/// Known contacts and groups plus the sorted chat list derived from them.
///
/// The list is rebuilt only when a record set changes, so its order stays
/// put while the user scrolls. Each record set holds at most one record per
/// JID, the last one given.
#[derive(Debug, Clone, Default)]
pub struct ChatDirectory {
    contacts: Vec<ContactRecord>,
    groups: Vec<GroupRecord>,
    entries: Vec<ChatListEntry>,
}

impl ChatDirectory {
    pub fn new(contacts: Vec<ContactRecord>, groups: Vec<GroupRecord>) -> Self {
        let contacts = keep_last_per_jid(contacts, |c| &c.jid);
        let groups = keep_last_per_jid(groups, |g| &g.jid);
        let entries = derive_entries(&contacts, &groups);
        Self {
            contacts,
            groups,
            entries,
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self::new(snapshot.contacts, snapshot.groups)
    }

    pub fn entries(&self) -> &[ChatListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChatListEntry> {
        self.entries.get(index)
    }

    pub fn position(&self, jid: &Jid) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.jid == jid)
    }

    pub fn group(&self, jid: &Jid) -> Option<&GroupRecord> {
        self.groups.iter().find(|group| &group.jid == jid)
    }

    /// Replaces the contact with the same JID, or adds it.
    pub fn upsert_contact(&mut self, contact: ContactRecord) {
        match self.contacts.iter_mut().find(|c| c.jid == contact.jid) {
            Some(existing) => *existing = contact,
            None => self.contacts.push(contact),
        }
        self.rebuild();
    }

    /// Replaces the group with the same JID, or adds it.
    pub fn upsert_group(&mut self, group: GroupRecord) {
        match self.groups.iter_mut().find(|g| g.jid == group.jid) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.entries = derive_entries(&self.contacts, &self.groups);
    }
}

fn keep_last_per_jid<T>(records: Vec<T>, jid: impl Fn(&T) -> &Jid) -> Vec<T> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut kept: Vec<T> = records
        .into_iter()
        .rev()
        .filter(|record| seen.insert(jid(record).clone()))
        .collect();
    kept.reverse();
    kept
}

/// Merges contacts and groups into one list keyed by JID, later records
/// overriding earlier ones (groups are merged after contacts), sorted by name
/// and then by JID.
pub fn derive_entries(contacts: &[ContactRecord], groups: &[GroupRecord]) -> Vec<ChatListEntry> {
    let mut names: HashMap<&Jid, String> = HashMap::with_capacity(contacts.len() + groups.len());
    for contact in contacts {
        names.insert(&contact.jid, contact.display_name());
    }
    for group in groups {
        names.insert(&group.jid, group.display_name());
    }

    let mut entries: Vec<ChatListEntry> = names
        .into_iter()
        .map(|(jid, name)| ChatListEntry {
            jid: jid.clone(),
            name,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.jid.cmp(&b.jid)));
    entries
}
