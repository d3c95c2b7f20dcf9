//! User-management access rules.
//!
//! Every rule is expressed through [`Role::satisfies`] so the hierarchy is
//! defined once.
//!
//! | Action                      | Rule                                                   |
//! |-----------------------------|--------------------------------------------------------|
//! | open user management        | actor is `ADMIN` or above                              |
//! | edit / assign agents        | admin actor; a `SUPERADMIN` target needs a super admin |
//! | change role                 | as edit, and never on oneself                          |
//! | approve                     | super admin actor, target is `PENDING`                 |
//! | delete                      | admin actor, target is not `SUPERADMIN`                |

use crate::role::{Role, UserStatus};
use crate::user::UserProfile;

/// Returns `true` if `actor` may open the user-management area.
#[must_use]
pub fn can_manage_users(actor: &UserProfile) -> bool {
    actor.role.satisfies(Role::Admin)
}

/// Returns `true` if `actor` may edit `target` or change its agent assignments.
#[must_use]
pub fn can_edit_user(actor: &UserProfile, target: &UserProfile) -> bool {
    can_manage_users(actor) && actor.role.satisfies(target.role.max(Role::Admin))
}

/// Returns `true` if `actor` may change the role of `target`.
#[must_use]
pub fn can_change_role(actor: &UserProfile, target: &UserProfile) -> bool {
    actor.id != target.id && can_edit_user(actor, target)
}

/// Returns `true` if `actor` may grant `role` to another account.
#[must_use]
pub fn can_grant_role(actor: &UserProfile, role: Role) -> bool {
    can_manage_users(actor) && actor.role.satisfies(role)
}

/// Returns `true` if `actor` may approve `target`.
#[must_use]
pub fn can_approve_user(actor: &UserProfile, target: &UserProfile) -> bool {
    actor.role.satisfies(Role::SuperAdmin) && target.status == Some(UserStatus::Pending)
}

/// Returns `true` if `actor` may delete `target`.
#[must_use]
pub fn can_delete_user(actor: &UserProfile, target: &UserProfile) -> bool {
    can_manage_users(actor) && target.role != Role::SuperAdmin
}
