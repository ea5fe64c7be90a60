pub mod build_info;

use tracing_subscriber::{fmt, EnvFilter};

/// Filter applied when neither `RUST_LOG` nor a configured directive is present.
pub const DEFAULT_LOG_DIRECTIVE: &str = "fintrack=info";

/// Installs the global `fmt` subscriber. Safe to call when one is already set.
pub fn init_tracing(directive: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(directive.unwrap_or(DEFAULT_LOG_DIRECTIVE))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
    });

    let _ = fmt().with_env_filter(filter).try_init();
}
