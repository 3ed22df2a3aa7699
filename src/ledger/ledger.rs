use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::ChartOfAccounts, budget::BudgetPlan, mapping::KeywordRule, seed,
    transaction::Transaction,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Record of a period close: nominal balances rolled into retained earnings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodClose {
    pub closed_at: DateTime<Utc>,
    /// Number of transactions covered; later entries form the open period.
    pub transaction_count: usize,
    pub net_income: Decimal,
    pub retained_account_id: String,
}

/// All bookkeeping state of one outlet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub outlet_id: String,
    #[serde(default)]
    pub accounts: ChartOfAccounts,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<BudgetPlan>,
    #[serde(default)]
    pub rules: Vec<KeywordRule>,
    #[serde(default)]
    pub closes: Vec<PeriodClose>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    /// Creates an empty ledger with no accounts.
    pub fn new(outlet_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            outlet_id: outlet_id.into(),
            accounts: ChartOfAccounts::new(),
            transactions: Vec::new(),
            budgets: Vec::new(),
            rules: Vec::new(),
            closes: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Creates a ledger with the default chart of accounts and keyword rules.
    pub fn seeded(outlet_id: impl Into<String>) -> Self {
        let mut ledger = Self::new(outlet_id);
        ledger.accounts = seed::seed_chart();
        ledger.rules = seed::seed_rules();
        ledger
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn budget(&self, id: Uuid) -> Option<&BudgetPlan> {
        self.budgets.iter().find(|plan| plan.id == id)
    }

    pub fn last_close(&self) -> Option<&PeriodClose> {
        self.closes.last()
    }

    pub fn closed_through(&self) -> Option<DateTime<Utc>> {
        self.last_close().map(|close| close.closed_at)
    }

    /// Transactions recorded since the last period close.
    pub fn open_transactions(&self) -> &[Transaction] {
        let start = self
            .last_close()
            .map(|close| close.transaction_count.min(self.transactions.len()))
            .unwrap_or(0);
        &self.transactions[start..]
    }

    /// Whether any transaction, budget, or rule references `account_id`.
    pub fn is_account_referenced(&self, account_id: &str) -> bool {
        self.transactions.iter().any(|txn| txn.touches(account_id))
            || self.budgets.iter().any(|plan| plan.account_id == account_id)
            || self.rules.iter().any(|rule| {
                rule.target_account_id == account_id || rule.source_account_id == account_id
            })
    }

    /// Detects dangling references within a loaded snapshot.
    pub fn warnings(&self) -> Vec<String> {
        let known: HashSet<&str> = self.accounts.iter().map(|a| a.id.as_str()).collect();
        let mut warnings = Vec::new();
        for txn in &self.transactions {
            if txn.is_unattributed() {
                continue;
            }
            for id in [&txn.debit_account_id, &txn.credit_account_id] {
                if !known.contains(id.as_str()) {
                    warnings.push(format!(
                        "transaction {} references unknown account {}",
                        txn.id, id
                    ));
                }
            }
        }
        for plan in &self.budgets {
            if !known.contains(plan.account_id.as_str()) {
                warnings.push(format!(
                    "budget {} references unknown account {}",
                    plan.id, plan.account_id
                ));
            }
        }
        warnings
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
