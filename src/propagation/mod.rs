//! Keeps every site-owned record's ACL, and each content table's class-level
//! permissions, in line with the site's collaboration roster.

use crate::db::repository::Repository;
use crate::join::{join_collect, Batch, Report};
use crate::schema::SchemaPermissionSync;
use crate::types::acl::Acl;
use crate::types::collaboration::{Collaboration, Role};
use crate::types::error::AppError;
use crate::types::model::Model;
use crate::types::record::{Pointer, Record};
use crate::types::site::Site;
use tracing::{debug, info};

pub mod queue;

/// What a propagation issued and which writes failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    pub site_id: Option<String>,
    pub user_id: Option<String>,
    pub deleting: bool,
    /// Pending invites have no user yet and propagate nothing.
    pub skipped: bool,
    pub report: Report,
}

impl PropagationReport {
    fn skipped(deleting: bool) -> Self {
        Self {
            deleting,
            skipped: true,
            ..Default::default()
        }
    }
}

struct Target {
    collaboration: Collaboration,
    user: Pointer,
    site: Record,
    owner_id: String,
}

impl Target {
    fn user_id(&self) -> &str {
        &self.user.object_id
    }

    fn role(&self) -> Role {
        self.collaboration.role
    }
}

pub struct CollaborationPropagator {
    repo: Repository,
    schema: SchemaPermissionSync,
}

/// The record's ACL (or an owner-only default) adjusted for one user.
fn grant(record: &Record, owner_id: &str, user_id: &str, read: bool, write: bool) -> Acl {
    let mut acl = record.acl.clone().unwrap_or_else(|| Acl::owned_by(owner_id));
    acl.set_read_access(user_id, read);
    acl.set_write_access(user_id, write);
    acl
}

impl CollaborationPropagator {
    pub fn new(repo: Repository, schema: SchemaPermissionSync) -> Self {
        Self { repo, schema }
    }

    /// Writes each ACL alone so concurrent edits to other keys survive.
    async fn write_acls(&self, label: &str, updates: &[(&Record, Acl)]) -> Batch<()> {
        let repo = &self.repo;
        join_collect(
            label,
            updates
                .iter()
                .map(|(record, acl)| async move { repo.save_acl(record, acl).await }),
        )
        .await
    }

    async fn resolve(&self, record: &Record) -> Result<Option<Target>, AppError> {
        let collaboration: Collaboration = record.decode()?;
        let Some(user) = collaboration.user.clone() else {
            debug!("Collaboration {:?} is still pending, nothing to propagate", record.id);
            return Ok(None);
        };
        let site = self.repo.fetch(&collaboration.site).await?;
        let owner_id = site.decode::<Site>()?.owner.object_id;
        Ok(Some(Target {
            collaboration,
            user,
            site,
            owner_id,
        }))
    }

    /// Other collaborations of the same site, excluding `record` itself.
    async fn siblings(&self, target: &Target, record: &Record) -> Result<Vec<(Record, Collaboration)>, AppError> {
        let site = &target.collaboration.site;
        let mut siblings = vec![];
        for rec in self.repo.site_collaborations_except(site, &target.user).await? {
            if rec.id.is_some() && rec.id == record.id {
                continue;
            }
            let collaboration = rec.decode()?;
            siblings.push((rec, collaboration));
        }
        Ok(siblings)
    }

    fn compose_own_acl(
        record: &Record,
        target: &Target,
        siblings: &[(Record, Collaboration)],
        deleting: bool,
    ) -> Acl {
        let mut acl = record
            .acl
            .clone()
            .unwrap_or_else(|| Acl::owned_by(&target.owner_id));
        if !deleting {
            // a sibling sees this membership only when the sibling is an admin
            for (_, sibling) in siblings {
                if let Some(user) = &sibling.user {
                    let admin = sibling.role.is_admin();
                    acl.set_access(&user.object_id, admin, admin);
                }
            }
        }
        acl.set_access(target.user_id(), true, true);
        acl
    }

    /// ACL the modifying collaboration itself should carry. `None` for a
    /// pending invite, whose ACL is left as is.
    pub async fn own_acl(&self, record: &Record, deleting: bool) -> Result<Option<Acl>, AppError> {
        let Some(target) = self.resolve(record).await? else {
            return Ok(None);
        };
        let siblings = self.siblings(&target, record).await?;
        Ok(Some(Self::compose_own_acl(record, &target, &siblings, deleting)))
    }

    /// Pushes the membership change in `record` to the site, its sibling
    /// collaborations, media items, models, model fields and content-table
    /// permissions. Every write is issued; failures are collected in the
    /// report, not raised.
    pub async fn propagate(&self, record: &Record, deleting: bool) -> Result<PropagationReport, AppError> {
        let Some(target) = self.resolve(record).await? else {
            return Ok(PropagationReport::skipped(deleting));
        };
        let repo = &self.repo;
        let owner_id = target.owner_id.as_str();
        let user_id = target.user_id();
        let role = target.role();
        let read = !deleting;
        let write = !deleting && role.is_admin();
        let mut report = Report::default();

        // the modifying user sees sibling memberships only as an admin
        let siblings = self.siblings(&target, record).await?;
        let updates: Vec<(&Record, Acl)> = siblings
            .iter()
            .map(|(rec, _)| (rec, grant(rec, owner_id, user_id, write, write)))
            .collect();
        report.push(self.write_acls("collaborations", &updates).await);

        let site = [(&target.site, grant(&target.site, owner_id, user_id, read, write))];
        report.push(self.write_acls("site", &site).await);

        let media = repo.site_media_items(&target.collaboration.site).await?;
        let updates: Vec<(&Record, Acl)> = media
            .iter()
            .map(|r| (r, grant(r, owner_id, user_id, read, write)))
            .collect();
        report.push(self.write_acls("media items", &updates).await);

        let models = repo.site_models(&target.collaboration.site).await?;
        let updates: Vec<(&Record, Acl)> = models
            .iter()
            .map(|r| (r, grant(r, owner_id, user_id, read, write)))
            .collect();
        report.push(self.write_acls("models", &updates).await);

        let mut tables = vec![];
        for model in &models {
            tables.push(model.decode::<Model>()?.table_name);
        }
        report.push(
            join_collect(
                "class permissions",
                tables
                    .iter()
                    .map(|t| self.schema.sync_collaborator(t, user_id, role, deleting)),
            )
            .await,
        );

        let pointers = models
            .iter()
            .map(Record::to_pointer)
            .collect::<Result<Vec<_>, _>>()?;
        let fields = repo.fields_of_models(&pointers).await?;
        let updates: Vec<(&Record, Acl)> = fields
            .iter()
            .map(|r| (r, grant(r, owner_id, user_id, read, write)))
            .collect();
        report.push(self.write_acls("model fields", &updates).await);

        info!(
            "Propagated {} of {} on site {}: {} writes, {} failed",
            if deleting { "removal" } else { "membership" },
            user_id,
            target.collaboration.site.object_id,
            report.issued(),
            report.failure_count()
        );

        Ok(PropagationReport {
            site_id: Some(target.collaboration.site.object_id.clone()),
            user_id: Some(user_id.to_string()),
            deleting,
            skipped: false,
            report,
        })
    }
}
