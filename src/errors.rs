use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::AccountCategory;

/// Names the role an account id played in a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Target,
    Source,
    Budget,
    Rule,
    RetainedEarnings,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountRole::Target => "target",
            AccountRole::Source => "source",
            AccountRole::Budget => "budget",
            AccountRole::Rule => "rule",
            AccountRole::RetainedEarnings => "retained earnings",
        };
        f.write_str(label)
    }
}

/// Error type that captures ledger failures.
///
/// Write operations return these before any state is touched; read
/// projections never produce them.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be greater than zero (got {0})")]
    InvalidAmount(Decimal),
    #[error("{role} account `{id}` does not exist")]
    MissingAccount { role: AccountRole, id: String },
    #[error("debit and credit account are both `{0}`")]
    SameAccount(String),
    #[error("cannot apply balance delta to unknown account `{0}`")]
    UnknownAccount(String),
    #[error("moving {amount} would overflow the balance of `{id}`")]
    BalanceOverflow { id: String, amount: Decimal },
    #[error("budget account `{id}` is {category}, expected EXPENSE")]
    BudgetAccountMismatch {
        id: String,
        category: AccountCategory,
    },
    #[error("account `{0}` not found")]
    NotFound(String),
    #[error("invalid account: {0}")]
    InvalidAccount(String),
    #[error("account `{0}` already exists")]
    DuplicateAccount(String),
    #[error("account `{0}` is a system account and cannot be removed")]
    ProtectedAccount(String),
    #[error("account `{0}` is referenced by ledger data")]
    AccountInUse(String),
    #[error("budget plan `{0}` not found")]
    BudgetNotFound(String),
    #[error("invalid keyword rule: {0}")]
    InvalidRule(String),
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
