use serde::{Deserialize, Serialize};

use keyward_core::{RoleId, ValueObject};

/// Role held by the authenticated user.
///
/// Roles are descriptive at this layer: authorization decisions are made
/// on abilities, and the identity service has already expanded roles into
/// them by the time a profile reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    key: String,
    label: String,
}

impl Role {
    pub fn new(id: RoleId, key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl ValueObject for Role {}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.key)
    }
}
