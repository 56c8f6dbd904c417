use crate::hooks::{required_pointer, HookOutcome, SiteRoster};
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::model::Model;
use crate::types::record::Record;

pub async fn before_save(services: &Services, mut field: Record) -> Result<HookOutcome, AppError> {
    if !field.is_new() {
        return Ok(HookOutcome::Save(field));
    }
    let model: Model = services
        .repo
        .fetch(&required_pointer(&field, "model")?)
        .await?
        .decode()?;
    let roster = SiteRoster::load(services, &model.site).await?;
    field.acl = Some(roster.acl());
    Ok(HookOutcome::Save(field))
}
