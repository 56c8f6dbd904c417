//! Hook-level rights check. Advisory only: the object store still enforces
//! its own ACLs on every request that does not carry the master key.

use crate::types::acl::Acl;
use crate::types::error::AppError;
use crate::types::record::Record;
use crate::types::user::Actor;

/// Records without an ACL are open to everyone. Otherwise the actor needs
/// both read and write, or the record must be publicly readable and writable.
pub fn can_act(actor_id: &str, acl: Option<&Acl>) -> bool {
    let Some(acl) = acl else {
        return true;
    };
    (acl.read_access(actor_id) && acl.write_access(actor_id))
        || (acl.public_read_access() && acl.public_write_access())
}

pub fn can_act_on(actor: &Actor, record: &Record) -> bool {
    can_act(&actor.id, record.acl.as_ref())
}

pub fn ensure_can_act(actor: &Actor, record: &Record) -> Result<(), AppError> {
    if can_act_on(actor, record) {
        Ok(())
    } else {
        Err(AppError::AccessDenied)
    }
}
