//! Tracing/logging initialization.
//!
//! The engine only emits events through `tracing`; installing a subscriber
//! is left to the host, which can call into here or bring its own.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable, for terminals and test output.
    Pretty,
}

/// Build the filter: `RUST_LOG` if it parses, otherwise `default_filter`.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(format: Format, default_filter: &str) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(false);

    let _ = match format {
        Format::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        Format::Pretty => builder.with_test_writer().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init(Format::Pretty, "debug");
        init(Format::Json, DEFAULT_FILTER);
        ::tracing::info!("still logging");
    }

    #[test]
    fn json_is_the_default_format() {
        assert_eq!(Format::default(), Format::Json);
    }
}
