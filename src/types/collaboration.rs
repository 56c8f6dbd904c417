use crate::types::record::Pointer;
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_EDITOR: &str = "EDITOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Editor,
    /// Any other role the frontend assigns; read-only membership.
    Viewer,
}

impl Role {
    pub fn parse(role: &str) -> Self {
        match role {
            ROLE_ADMIN => Role::Admin,
            ROLE_EDITOR => Role::Editor,
            _ => Role::Viewer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Editor => ROLE_EDITOR,
            Role::Viewer => "VIEWER",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Role::parse(&String::deserialize(d)?))
    }
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Roles allowed to write content rows.
    pub fn can_write_content(self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }
}

/// Membership of a user (or a pending invite email) in a site.
#[derive(Deserialize, Debug, Clone)]
pub struct Collaboration {
    #[serde(rename = "objectId", default)]
    pub id: Option<String>,
    pub site: Pointer,
    #[serde(default)]
    pub user: Option<Pointer>,
    #[serde(default = "default_role", deserialize_with = "role_or_viewer")]
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
}

fn default_role() -> Role {
    Role::Viewer
}

fn role_or_viewer<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Role, D::Error> {
    Ok(Option::<Role>::deserialize(d)?.unwrap_or(Role::Viewer))
}

impl Collaboration {
    pub fn is_pending(&self) -> bool {
        self.user.is_none()
    }
}
