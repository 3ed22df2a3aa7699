pub mod account_service;
pub mod budget_service;
pub mod mapping_service;
pub mod query_service;
pub mod report_service;
pub mod summary_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use budget_service::{BudgetDraft, BudgetService};
pub use mapping_service::MappingService;
pub use query_service::QueryService;
pub use report_service::{BalanceLine, BalanceSheet, ProfitAndLoss, ReportService};
pub use summary_service::{CashflowTotals, SummaryService};
pub use transaction_service::{Posting, PostingContext, TransactionService};

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, LedgerError>;
