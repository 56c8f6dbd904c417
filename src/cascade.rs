//! Rights-checked cascading deletion over the site → model → field/row →
//! media ownership graph.

use crate::db::repository::Repository;
use crate::join::{join_collect, Batch, Report};
use crate::rights::{can_act_on, ensure_can_act};
use crate::schema::SchemaPermissionSync;
use crate::types::error::AppError;
use crate::types::model::{scrub_model_reference, Model, DRAFT_OWNER_FIELD};
use crate::types::record::{Pointer, Record};
use crate::types::user::Actor;
use serde_json::Map;
use std::collections::HashSet;
use tracing::{debug, info};

/// The two optional phases of a model deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDeletion {
    /// Remove the model's `nameId` from other models' reference validations.
    pub delete_references: bool,
    /// Destroy the model record itself (off when the store is about to).
    pub delete_record: bool,
}

impl Default for ModelDeletion {
    fn default() -> Self {
        Self {
            delete_references: true,
            delete_record: true,
        }
    }
}

pub struct CascadingDeleter {
    repo: Repository,
    schema: SchemaPermissionSync,
}

impl CascadingDeleter {
    pub fn new(repo: Repository, schema: SchemaPermissionSync) -> Self {
        Self { repo, schema }
    }

    fn media_of(row: &Record, media_fields: &[String]) -> Vec<Pointer> {
        media_fields.iter().filter_map(|f| row.pointer(f)).collect()
    }

    async fn destroy_media(&self, media: Vec<Pointer>, report: &mut Report) {
        let repo = &self.repo;
        report.push(
            join_collect(
                "media items",
                media.iter().map(|p| async move {
                    repo.store().destroy(&p.class_name, &p.object_id).await
                }),
            )
            .await,
        );
    }

    /// Deletes a content row together with its draft and the media items
    /// either of them points to. Both rows are rights-checked before
    /// anything is touched.
    pub async fn delete_content_item(
        &self,
        actor: &Actor,
        table: &str,
        item_id: &str,
    ) -> Result<Report, AppError> {
        let item = self.repo.get(table, item_id).await?;
        ensure_can_act(actor, &item)?;
        let draft = self.repo.draft_of(table, item_id).await?;
        if let Some(draft) = &draft {
            ensure_can_act(actor, draft)?;
        }

        let media_fields = self
            .schema
            .read_table_schema(table)
            .await
            .map(|s| s.media_fields())
            .unwrap_or_default();

        let mut report = Report::default();
        self.destroy_media(Self::media_of(&item, &media_fields), &mut report)
            .await;
        if let Some(draft) = &draft {
            self.destroy_media(Self::media_of(draft, &media_fields), &mut report)
                .await;
            self.repo.destroy(draft).await?;
        }
        self.repo.destroy(&item).await?;

        debug!("Deleted {table}/{item_id} (draft: {})", draft.is_some());
        Ok(report)
    }

    /// Deletes a model's fields, content rows (with drafts and media) and
    /// backing table, then optionally scrubs references to it and destroys
    /// the model record. Nothing is touched when the rights check fails.
    pub async fn delete_model(
        &self,
        actor: &Actor,
        model: &Record,
        opts: ModelDeletion,
    ) -> Result<Report, AppError> {
        ensure_can_act(actor, model)?;
        let typed: Model = model.decode()?;
        let pointer = model.to_pointer()?;
        let repo = &self.repo;
        let mut report = Report::default();

        let fields: Vec<Record> = repo
            .model_fields(&pointer)
            .await?
            .into_iter()
            .filter(|f| can_act_on(actor, f))
            .collect();
        report.push(
            join_collect(
                "model fields",
                fields.iter().map(|f| async move { repo.destroy(f).await }),
            )
            .await,
        );

        let table = typed.table_name.as_str();
        let rows = repo.content_rows(table).await?;
        let ids: HashSet<&str> = rows.iter().filter_map(|r| r.id.as_deref()).collect();
        // drafts of rows in this batch go together with their owner
        let owners: Vec<&str> = rows
            .iter()
            .filter(|r| {
                r.pointer(DRAFT_OWNER_FIELD)
                    .map_or(true, |owner| !ids.contains(owner.object_id.as_str()))
            })
            .filter_map(|r| r.id.as_deref())
            .collect();
        let rows_batch = join_collect(
            "content rows",
            owners
                .iter()
                .map(|id| self.delete_content_item(actor, table, id)),
        )
        .await;
        for nested in rows_batch.outcomes.iter().flatten() {
            report.extend(nested.clone());
        }
        report.push(rows_batch);

        if let Err(err) = self.schema.drop_table(table).await {
            debug!("Dropping table {table} skipped: {err}");
        }

        if opts.delete_references {
            if let Some(name_id) = typed.name_id.as_deref() {
                report.push(self.scrub_references(&typed.site, &pointer, name_id).await?);
            }
        }

        if opts.delete_record {
            repo.destroy(model).await?;
        }

        info!(
            "Deleted model {} ({}): {} writes, {} failed",
            pointer.object_id,
            table,
            report.issued(),
            report.failure_count()
        );
        Ok(report)
    }

    async fn scrub_references(
        &self,
        site: &Pointer,
        model: &Pointer,
        name_id: &str,
    ) -> Result<Batch<()>, AppError> {
        let repo = &self.repo;
        let models = repo
            .site_models(site)
            .await?
            .iter()
            .map(Record::to_pointer)
            .collect::<Result<Vec<_>, _>>()?;

        let mut changed = vec![];
        for field in repo.reference_fields(&models, model).await? {
            let Some(mut validations) = field.get("validations").cloned() else {
                continue;
            };
            if scrub_model_reference(&mut validations, name_id) {
                let mut update = Map::new();
                update.insert("validations".to_string(), validations);
                changed.push((field, update));
            }
        }

        Ok(join_collect(
            "reference validations",
            changed
                .into_iter()
                .map(|(field, update)| async move { repo.update_fields(&field, update).await }),
        )
        .await)
    }

    /// Deletes every model of the site (without reference scrubbing, the
    /// referencing models go too) and every collaboration, bypassing
    /// propagation.
    pub async fn delete_site(&self, actor: &Actor, site: &Record) -> Result<Report, AppError> {
        ensure_can_act(actor, site)?;
        let pointer = site.to_pointer()?;
        let repo = &self.repo;
        let mut report = Report::default();

        let models = repo.site_models(&pointer).await?;
        let opts = ModelDeletion {
            delete_references: false,
            delete_record: true,
        };
        let models_batch = join_collect(
            "models",
            models.iter().map(|m| self.delete_model(actor, m, opts)),
        )
        .await;
        for nested in models_batch.outcomes.iter().flatten() {
            report.extend(nested.clone());
        }
        report.push(models_batch);

        let collaborations = repo.site_collaborations(&pointer).await?;
        report.push(
            join_collect(
                "collaborations",
                collaborations
                    .iter()
                    .map(|c| async move { repo.destroy(c).await }),
            )
            .await,
        );

        info!(
            "Cleared site {} before deletion: {} models, {} collaborations",
            pointer.object_id,
            models.len(),
            collaborations.len()
        );
        Ok(report)
    }
}
