use crate::hooks::{HookOutcome, SiteRoster};
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::record::Record;
use crate::types::site::MediaItem;

pub async fn before_save(services: &Services, mut item: Record) -> Result<HookOutcome, AppError> {
    if !item.is_new() {
        return Ok(HookOutcome::Save(item));
    }
    let site = item.decode::<MediaItem>()?.site;
    let roster = SiteRoster::load(services, &site).await?;
    item.acl = Some(roster.acl());
    Ok(HookOutcome::Save(item))
}
