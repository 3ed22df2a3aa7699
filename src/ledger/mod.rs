//! Ledger domain models, persistence-friendly types, and helpers.

pub mod account;
pub mod budget;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod mapping;
pub mod period;
pub mod seed;
pub mod transaction;

pub use account::{
    Account, AccountCategory, AccountFilter, AccountId, AccountSubcategory, ChartOfAccounts, Side,
};
pub use budget::{BudgetPlan, BudgetStatus};
pub use ledger::{Ledger, PeriodClose, CURRENT_SCHEMA_VERSION};
pub use mapping::{EntryDraft, KeywordMapper, KeywordRule, Selection, Suggestion};
pub use period::{BudgetPeriod, DateWindow};
pub use transaction::{
    posting_sides, RecordInput, Transaction, TransactionCategory, TransactionKind,
};
