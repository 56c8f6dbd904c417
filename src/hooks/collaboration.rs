use crate::hooks::{HookOutcome, HookRequest};
use crate::rights::ensure_can_act;
use crate::service::Services;
use crate::types::error::AppError;
use crate::types::record::Record;
use tracing::debug;

/// Rights-checks the roster change, fixes up the collaboration's own ACL
/// on save, and queues the site-wide propagation. Returns once queued.
pub async fn on_modify(
    services: &Services,
    req: &HookRequest,
    mut collaboration: Record,
    deleting: bool,
) -> Result<HookOutcome, AppError> {
    let actor = req.actor()?;
    ensure_can_act(actor, &collaboration)?;

    if !deleting {
        let propagator = services.propagation.propagator();
        if let Some(acl) = propagator.own_acl(&collaboration, false).await? {
            collaboration.acl = Some(acl);
        }
    }

    let ticket = services.propagation.enqueue(collaboration.clone(), deleting)?;
    debug!(
        "Queued {} propagation on site {}",
        if deleting { "removal" } else { "membership" },
        ticket.site_id
    );

    Ok(if deleting {
        HookOutcome::Proceed
    } else {
        HookOutcome::Save(collaboration)
    })
}
