use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PUBLIC: &str = "*";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessEntry {
    #[serde(default, skip_serializing_if = "is_false")]
    pub read: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub write: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl AccessEntry {
    fn is_empty(&self) -> bool {
        !self.read && !self.write
    }
}

/// Per-record permission descriptor, serialized the way the backend stores
/// it: `{"<user id>": {"read": true, "write": true}, "*": {"read": true}}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Acl(BTreeMap<String, AccessEntry>);

impl Acl {
    /// Read and write for the owner only.
    pub fn owned_by(owner_id: &str) -> Self {
        let mut acl = Acl::default();
        acl.set_read_access(owner_id, true);
        acl.set_write_access(owner_id, true);
        acl
    }

    pub fn read_access(&self, id: &str) -> bool {
        self.0.get(id).is_some_and(|e| e.read)
    }

    pub fn write_access(&self, id: &str) -> bool {
        self.0.get(id).is_some_and(|e| e.write)
    }

    pub fn public_read_access(&self) -> bool {
        self.read_access(PUBLIC)
    }

    pub fn public_write_access(&self) -> bool {
        self.write_access(PUBLIC)
    }

    pub fn set_read_access(&mut self, id: &str, allowed: bool) {
        self.update(id, |e| e.read = allowed);
    }

    pub fn set_write_access(&mut self, id: &str, allowed: bool) {
        self.update(id, |e| e.write = allowed);
    }

    pub fn set_public_read_access(&mut self, allowed: bool) {
        self.set_read_access(PUBLIC, allowed);
    }

    pub fn set_public_write_access(&mut self, allowed: bool) {
        self.set_write_access(PUBLIC, allowed);
    }

    /// Shorthand for the read/write pair most grants use.
    pub fn set_access(&mut self, id: &str, read: bool, write: bool) {
        self.set_read_access(id, read);
        self.set_write_access(id, write);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    // Empty entries are dropped so a revoked id leaves no trace.
    fn update(&mut self, id: &str, f: impl FnOnce(&mut AccessEntry)) {
        let entry = self.0.entry(id.to_string()).or_default();
        f(entry);
        if entry.is_empty() {
            self.0.remove(id);
        }
    }
}
