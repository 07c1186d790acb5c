//! Privilege tier access gate
//!
//! A pure predicate over an actor row and a requested action. Callers run
//! the gate before opening any transaction; a refusal maps to an
//! authorization error at the store boundary.
//!
//! Tiers are stored as integers (1 = administrator, 5 = editor,
//! 7 = observer); a smaller number grants more.

use crate::db::models::User;
use serde::{Deserialize, Serialize};

/// Privilege tier of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Tier {
    Administrator,
    Editor,
    Observer,
}

impl Tier {
    /// Stored integer level
    pub fn level(&self) -> i64 {
        match self {
            Tier::Administrator => 1,
            Tier::Editor => 5,
            Tier::Observer => 7,
        }
    }
}

impl From<Tier> for i64 {
    fn from(tier: Tier) -> i64 {
        tier.level()
    }
}

impl TryFrom<i64> for Tier {
    type Error = String;

    fn try_from(level: i64) -> Result<Tier, String> {
        match level {
            1 => Ok(Tier::Administrator),
            5 => Ok(Tier::Editor),
            7 => Ok(Tier::Observer),
            other => Err(format!("unknown privilege tier: {}", other)),
        }
    }
}

/// A privileged operation the gate can decide on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create or update structural content: comments, texts, vocabulary,
    /// corpus rows
    EditContent,
    /// Create users or change another user's tier
    ManageUsers,
    /// Flip the activation state of the user with this id
    SetActivated { user_id: i64, activated: bool },
    /// Reset the password of the user with this id
    ResetPassword { user_id: i64 },
    /// Edit the profile (name) of the user with this id
    EditProfile { user_id: i64 },
}

/// Decide whether `actor` may perform `action`.
///
/// Deactivated actors are refused everything. Administrators may do
/// anything except deactivate their own account; the refusal is an
/// identity comparison, not a tier rule, so it also binds a sole
/// remaining administrator.
pub fn authorize(actor: &User, action: Action) -> bool {
    if !actor.activated {
        return false;
    }

    match action {
        Action::EditContent => matches!(actor.tier, Tier::Administrator | Tier::Editor),
        Action::ManageUsers => actor.tier == Tier::Administrator,
        Action::SetActivated { user_id, activated } => {
            actor.tier == Tier::Administrator && (activated || user_id != actor.id)
        }
        Action::ResetPassword { .. } => actor.tier == Tier::Administrator,
        Action::EditProfile { user_id } => {
            actor.tier == Tier::Administrator || user_id == actor.id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, tier: Tier, activated: bool) -> User {
        User {
            id,
            name: format!("user-{}", id),
            tier,
            activated,
        }
    }

    #[test]
    fn test_editor_edits_content_observer_does_not() {
        assert!(authorize(&user(1, Tier::Administrator, true), Action::EditContent));
        assert!(authorize(&user(2, Tier::Editor, true), Action::EditContent));
        assert!(!authorize(&user(3, Tier::Observer, true), Action::EditContent));
    }

    #[test]
    fn test_only_administrators_manage_users() {
        assert!(authorize(&user(1, Tier::Administrator, true), Action::ManageUsers));
        assert!(!authorize(&user(2, Tier::Editor, true), Action::ManageUsers));
        assert!(!authorize(&user(3, Tier::Observer, true), Action::ManageUsers));

        let reset = Action::ResetPassword { user_id: 3 };
        assert!(authorize(&user(1, Tier::Administrator, true), reset));
        assert!(!authorize(&user(2, Tier::Editor, true), reset));
    }

    #[test]
    fn test_administrator_cannot_deactivate_self() {
        let admin = user(1, Tier::Administrator, true);
        assert!(!authorize(
            &admin,
            Action::SetActivated {
                user_id: 1,
                activated: false
            }
        ));
        assert!(authorize(
            &admin,
            Action::SetActivated {
                user_id: 2,
                activated: false
            }
        ));
        // Re-activating oneself is not the guarded direction
        assert!(authorize(
            &admin,
            Action::SetActivated {
                user_id: 1,
                activated: true
            }
        ));
    }

    #[test]
    fn test_profile_edits_are_self_or_administrator() {
        let observer = user(7, Tier::Observer, true);
        assert!(authorize(&observer, Action::EditProfile { user_id: 7 }));
        assert!(!authorize(&observer, Action::EditProfile { user_id: 8 }));
        assert!(authorize(
            &user(1, Tier::Administrator, true),
            Action::EditProfile { user_id: 8 }
        ));
    }

    #[test]
    fn test_deactivated_actor_is_refused_everything() {
        let ghost = user(1, Tier::Administrator, false);
        assert!(!authorize(&ghost, Action::EditContent));
        assert!(!authorize(&ghost, Action::ManageUsers));
        assert!(!authorize(&ghost, Action::EditProfile { user_id: 1 }));
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in [Tier::Administrator, Tier::Editor, Tier::Observer] {
            assert_eq!(Tier::try_from(tier.level()), Ok(tier));
        }
        assert!(Tier::try_from(3).is_err());
    }
}
