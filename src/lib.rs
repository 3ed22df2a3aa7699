#![doc(test(attr(deny(warnings))))]

//! Bookkeeping Core offers a simplified double-entry ledger: a chart of
//! accounts, atomic postings driven by a money-in/money-out toggle, budget
//! tracking, keyword-based account suggestions, and Profit & Loss / Balance
//! Sheet projections.

pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use crate::config::{Config, ConfigManager};
pub use crate::core::ledger_manager::{LedgerManager, LoadMetadata};
pub use crate::errors::{LedgerError, Result};
pub use crate::storage::{JsonStorage, MemoryStorage, StorageBackend};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with_filter(None);
}

/// Initializes global tracing using `filter` as the default directive when
/// `RUST_LOG` is not set.
pub fn init_with_filter(filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::info!("Bookkeeping Core tracing initialized.");
    });
}

/// Initializes tracing with the `log_filter` from `config`.
pub fn init_from_config(config: &Config) {
    init_with_filter(config.log_filter.as_deref());
}
