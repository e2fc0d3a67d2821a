//! Authenticated user snapshot.
//!
//! A [`User`] is materialised from the identity service's profile payload
//! ([`UserDetails`]) on every successful authentication event and replaced
//! wholesale on the next one. It is never edited in place.

use serde::{Deserialize, Serialize};

use keyward_core::{AbilityId, Entity, RoleId, UserId};

use crate::ability::Ability;
use crate::error::{AuthError, AuthResult};
use crate::role::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Wire model
// ─────────────────────────────────────────────────────────────────────────────

/// `{uuid, key, label}` record used for both abilities and roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub uuid: String,
    pub key: String,
    pub label: String,
}

/// Profile payload returned by the user-detail collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub uuid: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub abilities: Vec<GrantRecord>,
    #[serde(default)]
    pub roles: Vec<GrantRecord>,
    #[serde(default)]
    pub primary_role: Option<GrantRecord>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    first_name: String,
    last_name: String,
    email: String,
    abilities: Vec<Ability>,
    roles: Vec<Role>,
    primary_role: Option<Role>,
    is_admin: bool,
}

impl User {
    /// Materialise a user from a profile payload.
    ///
    /// Fails with [`AuthError::InvalidUserDetails`] if any identifier is not
    /// a UUID; a half-built user is never returned.
    pub fn from_details(details: UserDetails) -> AuthResult<Self> {
        let id = details
            .uuid
            .parse::<UserId>()
            .map_err(|e| AuthError::InvalidUserDetails(e.to_string()))?;

        let abilities = details
            .abilities
            .into_iter()
            .map(|record| {
                let ability_id = parse_id::<AbilityId>(&record.uuid)?;
                Ok(Ability::new(ability_id, record.key, record.label))
            })
            .collect::<AuthResult<Vec<_>>>()?;

        let roles = details
            .roles
            .into_iter()
            .map(role_from_record)
            .collect::<AuthResult<Vec<_>>>()?;

        let primary_role = details.primary_role.map(role_from_record).transpose()?;

        Ok(Self {
            id,
            first_name: details.first_name,
            last_name: details.last_name,
            email: details.email,
            abilities,
            roles,
            primary_role,
            is_admin: details.is_admin.unwrap_or(false),
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn abilities(&self) -> &[Ability] {
        &self.abilities
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn primary_role(&self) -> Option<&Role> {
        self.primary_role.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn parse_id<T>(raw: &str) -> AuthResult<T>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| AuthError::InvalidUserDetails(e.to_string()))
}

fn role_from_record(record: GrantRecord) -> AuthResult<Role> {
    let role_id = parse_id::<RoleId>(&record.uuid)?;
    Ok(Role::new(role_id, record.key, record.label))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
