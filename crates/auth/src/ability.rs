use serde::{Deserialize, Serialize};

use keyward_core::{AbilityId, ValueObject};

/// Key of the ability that grants everything.
pub const WILDCARD_KEY: &str = "*";

/// A single permission grant held by the authenticated user.
///
/// Abilities are opaque to the engine beyond their id and key. The ability
/// keyed `"*"` means "full access" and satisfies every query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability {
    id: AbilityId,
    key: String,
    label: String,
}

impl Ability {
    pub fn new(id: AbilityId, key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> AbilityId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_wildcard(&self) -> bool {
        self.key == WILDCARD_KEY
    }
}

impl ValueObject for Ability {}

impl core::fmt::Display for Ability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.key)
    }
}
