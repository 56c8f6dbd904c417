use crate::cascade::ModelDeletion;
use crate::hooks::{required_pointer, HookOutcome, HookRequest, SiteRoster};
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::model::Model;
use crate::types::record::Record;
use tracing::debug;

/// Stamps the roster ACL on a new model and creates its content table with
/// matching class-level permissions. A failed table write aborts the save.
pub async fn before_save(services: &Services, mut model: Record) -> Result<HookOutcome, AppError> {
    if !model.is_new() {
        return Ok(HookOutcome::Save(model));
    }
    let site = required_pointer(&model, "site")?;
    let table = model
        .str_field("tableName")
        .ok_or_else(|| AppError::Validation("Model has no tableName".into()))?
        .to_string();

    let roster = SiteRoster::load(services, &site).await?;
    model.acl = Some(roster.acl());
    services
        .schema
        .init_table_permissions(&table, &roster.owner_id, roster.roles())
        .await?;

    debug!("New model on table {table} with {} collaborators", roster.members.len());
    Ok(HookOutcome::Save(model))
}

/// The backend destroys the model record itself once this returns.
pub async fn before_delete(services: &Services, req: &HookRequest, model: Record) -> Result<HookOutcome, AppError> {
    let actor = req.actor()?;
    // fail early on a malformed payload rather than half-way through
    model.decode::<Model>()?;
    let opts = ModelDeletion {
        delete_references: true,
        delete_record: false,
    };
    services.deleter.delete_model(actor, &model, opts).await?;
    Ok(HookOutcome::Proceed)
}
