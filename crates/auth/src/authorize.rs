use serde::Serialize;

use keyward_core::{AbilityId, RoleId};

use crate::ability::WILDCARD_KEY;
use crate::session::SessionState;
use crate::user::User;

/// Read-only authorization queries over the current session.
///
/// - No IO
/// - No panics
/// - Unauthenticated sessions are denied everything
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationIndex<'a> {
    user: Option<&'a User>,
}

impl<'a> AuthorizationIndex<'a> {
    pub fn new(state: &'a SessionState) -> Self {
        Self {
            user: state.current_user(),
        }
    }

    pub fn for_user(user: &'a User) -> Self {
        Self { user: Some(user) }
    }

    /// Does the user hold the ability with this id (or the wildcard)?
    pub fn can_by_id(&self, ability_id: &AbilityId) -> bool {
        self.user.is_some_and(|user| {
            user.abilities()
                .iter()
                .any(|ability| ability.is_wildcard() || ability.id() == *ability_id)
        })
    }

    /// Does the user hold the ability with this key (or the wildcard)?
    pub fn can_by_key(&self, key: &str) -> bool {
        self.user.is_some_and(|user| {
            user.abilities()
                .iter()
                .any(|ability| ability.is_wildcard() || ability.key() == key)
        })
    }

    pub fn has_role_key(&self, key: &str) -> bool {
        self.user.is_some_and(|user| user.roles().iter().any(|role| role.key() == key))
    }

    pub fn has_role_id(&self, role_id: &RoleId) -> bool {
        self.user
            .is_some_and(|user| user.roles().iter().any(|role| role.id() == *role_id))
    }

    /// The profile's admin flag. Descriptive only; it does not grant abilities.
    pub fn is_admin(&self) -> bool {
        self.user.is_some_and(User::is_admin)
    }

    /// Explain what `can_by_key(key)` would answer and why.
    pub fn explain_ability(&self, key: &str) -> AuthorizationExplanation {
        let Some(user) = self.user else {
            return AuthorizationExplanation {
                required_ability: key.to_string(),
                granted: false,
                reason: "No authenticated user".to_string(),
                holder: None,
                denial_reason: Some(DenialReason {
                    kind: DenialKind::Unauthenticated,
                    message: "The session is not authenticated".to_string(),
                }),
            };
        };

        let mut held: Vec<String> = user.abilities().iter().map(|a| a.key().to_string()).collect();
        held.sort();
        held.dedup();

        let has_wildcard = held.iter().any(|k| k == WILDCARD_KEY);
        let has_required = held.iter().any(|k| k == key);

        let holder = HolderState {
            user_id: user.id().to_string(),
            roles: user.roles().iter().map(|r| r.key().to_string()).collect(),
            abilities: held,
            has_wildcard,
        };

        if has_wildcard || has_required {
            let reason = if has_wildcard {
                format!("User holds wildcard ability '{WILDCARD_KEY}'")
            } else {
                format!("User holds ability '{key}'")
            };

            AuthorizationExplanation {
                required_ability: key.to_string(),
                granted: true,
                reason,
                holder: Some(holder),
                denial_reason: None,
            }
        } else {
            AuthorizationExplanation {
                required_ability: key.to_string(),
                granted: false,
                reason: format!(
                    "User does not hold ability '{key}'. Current abilities: {:?}",
                    holder.abilities
                ),
                holder: Some(holder),
                denial_reason: Some(DenialReason {
                    kind: DenialKind::MissingAbility,
                    message: format!("Missing required ability: '{key}'"),
                }),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why an ability query was (or would be) answered the way it was.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_ability: String,
    pub granted: bool,
    pub reason: String,
    /// `None` when nobody is authenticated.
    pub holder: Option<HolderState>,
    pub denial_reason: Option<DenialReason>,
}

/// Snapshot of the user the query ran against.
#[derive(Debug, Clone, Serialize)]
pub struct HolderState {
    pub user_id: String,
    pub roles: Vec<String>,
    /// Sorted, deduplicated ability keys.
    pub abilities: Vec<String>,
    pub has_wildcard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Unauthenticated,
    MissingAbility,
}
