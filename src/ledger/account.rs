use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};

/// Stable account identifier such as `acc_cash`.
pub type AccountId = String;

/// The two sides of a posting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Debit => f.write_str("debit"),
            Side::Credit => f.write_str("credit"),
        }
    }
}

/// Top-level account classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountCategory {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountCategory {
    /// The side that increases an account of this category.
    pub fn normal_side(self) -> Side {
        match self {
            AccountCategory::Asset | AccountCategory::Expense => Side::Debit,
            AccountCategory::Liability | AccountCategory::Equity | AccountCategory::Revenue => {
                Side::Credit
            }
        }
    }

    /// Revenue and expense accounts are closed into equity at period end.
    pub fn is_nominal(self) -> bool {
        matches!(self, AccountCategory::Revenue | AccountCategory::Expense)
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountCategory::Asset => "ASSET",
            AccountCategory::Liability => "LIABILITY",
            AccountCategory::Equity => "EQUITY",
            AccountCategory::Revenue => "REVENUE",
            AccountCategory::Expense => "EXPENSE",
        };
        f.write_str(label)
    }
}

/// Balance Sheet refinement of assets and liabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountSubcategory {
    Current,
    Fixed,
    #[serde(rename = "Long-term")]
    LongTerm,
}

/// A chart of accounts entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub code: String,
    pub name: String,
    pub category: AccountCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<AccountSubcategory>,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub balance: Decimal,
}

impl Account {
    /// Creates a non-system account with a zero balance.
    pub fn new(
        id: impl Into<AccountId>,
        code: impl Into<String>,
        name: impl Into<String>,
        category: AccountCategory,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            category,
            subcategory: None,
            is_system: false,
            balance: Decimal::ZERO,
        }
    }

    pub fn with_subcategory(mut self, subcategory: AccountSubcategory) -> Self {
        self.subcategory = Some(subcategory);
        self
    }

    /// Marks the account as protected from deletion.
    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// Signed balance change caused by posting `amount` on `side`.
    pub fn delta_for(&self, side: Side, amount: Decimal) -> Decimal {
        if self.category.normal_side() == side {
            amount
        } else {
            -amount
        }
    }
}

/// Restricts [`ChartOfAccounts::list`] results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub category: Option<AccountCategory>,
    pub subcategory: Option<AccountSubcategory>,
}

impl AccountFilter {
    pub fn category(category: AccountCategory) -> Self {
        Self {
            category: Some(category),
            subcategory: None,
        }
    }

    pub fn matches(&self, account: &Account) -> bool {
        self.category.map_or(true, |c| account.category == c)
            && self
                .subcategory
                .map_or(true, |s| account.subcategory == Some(s))
    }
}

/// Key-value registry of accounts keyed by id.
///
/// Balances change only through [`ChartOfAccounts::apply_delta`] and
/// [`ChartOfAccounts::apply_deltas`], which the posting code owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChartOfAccounts {
    accounts: BTreeMap<AccountId, Account>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Accounts matching `filter`, ordered by ledger code.
    pub fn list(&self, filter: &AccountFilter) -> Vec<&Account> {
        let mut matches: Vec<&Account> = self
            .accounts
            .values()
            .filter(|account| filter.matches(account))
            .collect();
        matches.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.id.cmp(&b.id)));
        matches
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Sum of balances for every account in `category`, saturating at the
    /// decimal range.
    pub fn total(&self, category: AccountCategory) -> Decimal {
        self.accounts
            .values()
            .filter(|account| account.category == category)
            .fold(Decimal::ZERO, |sum, account| sum.saturating_add(account.balance))
    }

    pub(crate) fn insert(&mut self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Account> {
        self.accounts.remove(id)
    }

    pub(crate) fn apply_delta(&mut self, id: &str, delta: Decimal) -> Result<Account> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownAccount(id.to_string()))?;
        account.balance = shifted(account, delta)?;
        Ok(account.clone())
    }

    /// Applies every delta or none of them.
    pub(crate) fn apply_deltas(&mut self, deltas: &[(AccountId, Decimal)]) -> Result<()> {
        let mut staged: BTreeMap<&str, Account> = BTreeMap::new();
        for (id, delta) in deltas {
            let account = match staged.remove(id.as_str()) {
                Some(account) => account,
                None => self
                    .get(id)
                    .cloned()
                    .ok_or_else(|| LedgerError::UnknownAccount(id.clone()))?,
            };
            let balance = shifted(&account, *delta)?;
            staged.insert(id.as_str(), Account { balance, ..account });
        }
        for (_, account) in staged {
            self.insert(account);
        }
        Ok(())
    }
}

/// `account.balance + delta`, or `BalanceOverflow` past the decimal range.
pub(crate) fn shifted(account: &Account, delta: Decimal) -> Result<Decimal> {
    account
        .balance
        .checked_add(delta)
        .ok_or_else(|| LedgerError::BalanceOverflow {
            id: account.id.clone(),
            amount: delta,
        })
}

impl FromIterator<Account> for ChartOfAccounts {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        let mut chart = ChartOfAccounts::new();
        for account in iter {
            chart.insert(account);
        }
        chart
    }
}
