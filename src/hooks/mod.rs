//! Lifecycle triggers the backend calls around record mutations. A trigger
//! may veto the mutation by returning an error; before-save triggers may
//! also rewrite the object.

use crate::service::Services;
use crate::types::acl::Acl;
use crate::types::class;
use crate::types::collaboration::{Collaboration, Role};
use crate::types::error::AppError;
use crate::types::record::{Pointer, Record};
use crate::types::site::Site;
use crate::types::user::Actor;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub mod collaboration;
pub mod media_item;
pub mod model;
pub mod model_field;
pub mod site;
pub mod user;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    BeforeSave,
    AfterSave,
    BeforeDelete,
}

impl FromStr for Trigger {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beforeSave" => Ok(Trigger::BeforeSave),
            "afterSave" => Ok(Trigger::AfterSave),
            "beforeDelete" => Ok(Trigger::BeforeDelete),
            other => Err(AppError::NotFound(format!("trigger {other}"))),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::BeforeSave => "beforeSave",
            Trigger::AfterSave => "afterSave",
            Trigger::BeforeDelete => "beforeDelete",
        })
    }
}

/// Trigger payload as the backend posts it.
#[derive(Deserialize, Debug, Clone)]
pub struct HookRequest {
    #[serde(default)]
    pub master: bool,
    #[serde(default)]
    pub user: Option<Actor>,
    pub object: Value,
}

impl HookRequest {
    pub fn actor(&self) -> Result<&Actor, AppError> {
        self.user.as_ref().ok_or(AppError::AuthRequired)
    }

    pub fn record(&self, class_name: &str) -> Result<Record, AppError> {
        Record::from_json(class_name, self.object.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Save this version of the object.
    Save(Record),
    /// Let the mutation go ahead as requested.
    Proceed,
}

pub async fn dispatch(
    services: &Services,
    class_name: &str,
    trigger: Trigger,
    req: HookRequest,
) -> Result<HookOutcome, AppError> {
    let record = req.record(class_name)?;
    // master callers skip everything except the user triggers
    if req.master && class_name != class::USER {
        return Ok(match trigger {
            Trigger::BeforeSave => HookOutcome::Save(record),
            _ => HookOutcome::Proceed,
        });
    }

    match (class_name, trigger) {
        (class::SITE, Trigger::BeforeSave) => site::before_save(services, &req, record).await,
        (class::SITE, Trigger::BeforeDelete) => site::before_delete(services, &req, record).await,
        (class::MODEL, Trigger::BeforeSave) => model::before_save(services, record).await,
        (class::MODEL, Trigger::BeforeDelete) => model::before_delete(services, &req, record).await,
        (class::MODEL_FIELD, Trigger::BeforeSave) => model_field::before_save(services, record).await,
        (class::MEDIA_ITEM, Trigger::BeforeSave) => media_item::before_save(services, record).await,
        (class::COLLABORATION, Trigger::BeforeSave) => {
            collaboration::on_modify(services, &req, record, false).await
        }
        (class::COLLABORATION, Trigger::BeforeDelete) => {
            collaboration::on_modify(services, &req, record, true).await
        }
        (class::USER, Trigger::BeforeSave) => Ok(user::before_save(record)),
        (class::USER, Trigger::AfterSave) => user::after_save(services, record).await,
        _ => Err(AppError::NotFound(format!("{trigger} trigger for {class_name}"))),
    }
}

/// The site owner and its linked collaborators, for stamping ACLs on new
/// site-owned records.
pub(crate) struct SiteRoster {
    pub owner_id: String,
    pub members: Vec<(String, Role)>,
}

impl SiteRoster {
    pub async fn load(services: &Services, site: &Pointer) -> Result<Self, AppError> {
        let owner_id = services.repo.fetch(site).await?.decode::<Site>()?.owner.object_id;
        let mut members = vec![];
        for record in services.repo.site_collaborations(site).await? {
            let collaboration: Collaboration = record.decode()?;
            // pending invites have no one to grant to yet
            if let Some(user) = collaboration.user {
                members.push((user.object_id, collaboration.role));
            }
        }
        Ok(Self { owner_id, members })
    }

    /// Owner gets read+write, every member reads and admins also write.
    pub fn acl(&self) -> Acl {
        let mut acl = Acl::owned_by(&self.owner_id);
        for (user_id, role) in &self.members {
            acl.set_access(user_id, true, role.is_admin());
        }
        acl
    }

    pub fn roles(&self) -> impl Iterator<Item = (&str, Role)> {
        self.members.iter().map(|(id, role)| (id.as_str(), *role))
    }
}

/// Pointer field of a record being saved, or a validation error naming it.
pub(crate) fn required_pointer(record: &Record, key: &str) -> Result<Pointer, AppError> {
    record
        .pointer(key)
        .ok_or_else(|| AppError::Validation(format!("{} has no {key}", record.class_name)))
}
