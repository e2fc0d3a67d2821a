//! Process-wide tracing setup for hosts embedding the SDK.

/// Tracing configuration (filters, formatter).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, Format};

/// Initialize JSON tracing with the default filter.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(Format::Json, DEFAULT_FILTER);
}
