//! `keyward-core` — identity and time primitives shared by the session engine.
//!
//! Nothing in here performs IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod time;
pub mod value_object;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{AbilityId, RoleId, UserId};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource, expires_after};
pub use value_object::ValueObject;
