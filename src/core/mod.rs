//! Services, orchestration, and shared infrastructure over the ledger domain.

pub mod ledger_manager;
pub mod services;
pub mod time;
pub mod utils;
