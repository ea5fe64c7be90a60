#![doc(test(attr(deny(warnings))))]

//! Fintrack keeps a personal ledger with a running balance, materialises
//! recurring transactions, and computes the summaries and what-if projections
//! shown on a finance dashboard.

pub mod errors;
mod sample;
pub mod session;
pub mod utils;

pub use errors::FintrackError;
pub use fintrack_config as config;
pub use fintrack_core as engine;
pub use fintrack_domain as domain;
pub use fintrack_storage_json as storage;
pub use session::Session;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter and emits a startup log.
pub fn init() {
    init_with_filter(None);
}

/// Like [`init`], honouring a filter directive such as `Config::log_filter`.
/// `RUST_LOG` still takes precedence when set.
pub fn init_with_filter(directive: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        let build = utils::build_info::current();
        tracing::info!(build = %build.summary(), "Fintrack tracing initialized.");
    });
}
