use crate::hooks::{HookOutcome, HookRequest};
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::record::Record;
use tracing::info;

/// New sites only: the owner's plan must leave room for another site.
pub async fn before_save(services: &Services, req: &HookRequest, site: Record) -> Result<HookOutcome, AppError> {
    if !site.is_new() {
        return Ok(HookOutcome::Save(site));
    }
    let actor = req.actor()?;
    services.plans.check_site_quota(&actor.id).await?;
    Ok(HookOutcome::Save(site))
}

pub async fn before_delete(services: &Services, req: &HookRequest, site: Record) -> Result<HookOutcome, AppError> {
    let actor = req.actor()?;
    let report = services.deleter.delete_site(actor, &site).await?;
    info!(
        "Site {} cleared by {}: {} deletions, {} failed",
        site.id.as_deref().unwrap_or_default(),
        actor.id,
        report.issued(),
        report.failure_count()
    );
    Ok(HookOutcome::Proceed)
}
