use crate::hooks::HookOutcome;
use crate::join::join_collect;
use crate::service::Services;
use crate::types::collaboration::Collaboration;
use crate::types::error::AppError;
use crate::types::record::Record;
use serde_json::Map;
use tracing::info;

/// Usernames always mirror the email address.
pub fn before_save(mut user: Record) -> HookOutcome {
    if let Some(email) = user.get("email").cloned() {
        if user.get("username") != Some(&email) {
            user.set("username", email);
        }
    }
    HookOutcome::Save(user)
}

/// Claims the pending invites addressed to the user's email. Each claimed
/// collaboration gets its own ACL (the user plus admin siblings) and is saved
/// before its propagation is queued.
pub async fn after_save(services: &Services, user: Record) -> Result<HookOutcome, AppError> {
    let Some(email) = user.str_field("email").filter(|e| !e.is_empty()) else {
        return Ok(HookOutcome::Proceed);
    };
    let pointer = user.to_pointer()?;

    let mut pending = vec![];
    for mut record in services.repo.pending_collaborations_for_email(email).await? {
        if !record.decode::<Collaboration>()?.is_pending() {
            continue;
        }
        record.set("user", &pointer);
        record.set("email", "");
        pending.push(record);
    }

    let repo = &services.repo;
    let queue = &services.propagation;
    let batch = join_collect(
        "claimed invites",
        pending.into_iter().map(|mut record| async move {
            if let Some(acl) = queue.propagator().own_acl(&record, false).await? {
                record.acl = Some(acl);
            }
            let mut claim = Map::new();
            for key in ["user", "email"] {
                if let Some(value) = record.get(key) {
                    claim.insert(key.to_string(), value.clone());
                }
            }
            if let Some(acl) = &record.acl {
                claim.insert("ACL".to_string(), serde_json::to_value(acl)?);
            }
            repo.update_fields(&record, claim).await?;
            queue.enqueue(record, false).map(drop)
        }),
    )
    .await;

    info!(
        "User {} claimed {} invites, {} failed",
        pointer.object_id,
        batch.len(),
        batch.failure_count()
    );
    batch.summarize();
    Ok(HookOutcome::Proceed)
}
