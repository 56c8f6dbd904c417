use crate::types::collaboration::Role;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Actor id → `true`. Absence is the only way to express "no permission".
/// Values stay raw JSON so keys like `pointerFields` or
/// `requiresAuthentication` survive a read-modify-write.
pub type Bucket = BTreeMap<String, Value>;

/// Class-level permissions of a content table.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ClassLevelPermissions {
    #[serde(default)]
    pub get: Bucket,
    #[serde(default)]
    pub find: Bucket,
    #[serde(default)]
    pub create: Bucket,
    #[serde(default)]
    pub update: Bucket,
    #[serde(default)]
    pub delete: Bucket,
    #[serde(rename = "addField", default)]
    pub add_field: Bucket,
    /// Keys this service does not manage (`count`, `protectedFields`, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn set(bucket: &mut Bucket, id: &str, granted: bool) {
    if granted {
        bucket.insert(id.to_string(), Value::Bool(true));
    } else {
        bucket.remove(id);
    }
}

impl ClassLevelPermissions {
    /// Applies the collaborator policy for one user: read buckets for any
    /// role, write buckets for admins and editors, `addField` for admins.
    /// With `deleting` every entry of the user is removed.
    pub fn apply_collaborator(&mut self, user_id: &str, role: Role, deleting: bool) {
        let read = !deleting;
        let write = !deleting && role.can_write_content();
        let admin = !deleting && role.is_admin();

        set(&mut self.get, user_id, read);
        set(&mut self.find, user_id, read);
        set(&mut self.create, user_id, write);
        set(&mut self.update, user_id, write);
        set(&mut self.delete, user_id, write);
        set(&mut self.add_field, user_id, admin);
    }

    /// Permissions of a freshly created content table: the owner gets every
    /// bucket, each collaborator what their role allows.
    pub fn for_roster<'a>(owner_id: &str, roster: impl IntoIterator<Item = (&'a str, Role)>) -> Self {
        let mut clp = ClassLevelPermissions::default();
        clp.apply_collaborator(owner_id, Role::Admin, false);
        for (user_id, role) in roster {
            clp.apply_collaborator(user_id, role, false);
        }
        clp
    }

    pub fn buckets(&self) -> [(&'static str, &Bucket); 6] {
        [
            ("get", &self.get),
            ("find", &self.find),
            ("create", &self.create),
            ("update", &self.update),
            ("delete", &self.delete),
            ("addField", &self.add_field),
        ]
    }

    /// Names of the buckets granting `user_id`.
    pub fn granted_to(&self, user_id: &str) -> Vec<&'static str> {
        self.buckets()
            .into_iter()
            .filter(|(_, b)| b.contains_key(user_id))
            .map(|(name, _)| name)
            .collect()
    }
}
