//! Authorization policy for content mutations.
//!
//! Two distinct rules, kept as explicit functions so each stays
//! auditable on its own: editing requires ownership, deletion accepts
//! ownership or an administrator.

use mp_core::models::ContentRecord;
use uuid::Uuid;

/// The caller, as resolved by the (external) authentication layer.
/// Both fields are trusted verbatim.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub id: Uuid,
    pub is_admin: bool,
}

impl Principal {
    pub fn member(id: Uuid) -> Self {
        Self {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self { id, is_admin: true }
    }
}

/// Only the author may edit. Administrators get no override here.
pub fn can_edit(principal: &Principal, record: &ContentRecord) -> bool {
    record.is_owner(principal.id)
}

/// The author or any administrator may delete.
pub fn can_delete(principal: &Principal, record: &ContentRecord) -> bool {
    record.is_owner(principal.id) || principal.is_admin
}
