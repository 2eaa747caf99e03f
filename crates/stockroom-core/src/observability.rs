//! Logging setup and the span wrapped around inventory mutations.

use std::sync::Once;

use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable output.
    #[default]
    Pretty,
}

impl LogFormat {
    /// Pretty output in debug runs, JSON otherwise.
    #[must_use]
    pub const fn for_debug(debug: bool) -> Self {
        if debug { Self::Pretty } else { Self::Json }
    }
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// Levels come from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let registry = tracing_subscriber::registry().with(filter);
        match format {
            LogFormat::Json => registry.with(fmt::layer().json()).init(),
            LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
        }
    });
}

/// Span for one create, update, or delete against a collection.
#[must_use]
pub fn inventory_span(operation: &str, collection: &str) -> Span {
    tracing::info_span!("inventory", op = operation, collection = collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_runs_log_pretty() {
        assert_eq!(LogFormat::for_debug(true), LogFormat::Pretty);
        assert_eq!(LogFormat::for_debug(false), LogFormat::Json);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Json);
        let _guard = inventory_span("create_item", "items").entered();
        tracing::info!("logged inside span");
    }
}
