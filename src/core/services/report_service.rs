//! Profit & Loss and Balance Sheet projections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{
    Account, AccountCategory, AccountFilter, AccountSubcategory, ChartOfAccounts, DateWindow, Side,
    Transaction, TransactionCategory,
};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProfitAndLoss {
    pub window: Option<DateWindow>,
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub gross_profit: Decimal,
    pub other_income: Decimal,
    /// Operating expenses keyed by expense account name.
    pub expenses: BTreeMap<String, Decimal>,
    pub total_op_expense: Decimal,
    pub net_income: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BalanceLine {
    pub id: String,
    pub code: String,
    pub name: String,
    pub balance: Decimal,
}

impl From<&Account> for BalanceLine {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            code: account.code.clone(),
            name: account.name.clone(),
            balance: account.balance,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BalanceSheet {
    pub closed_through: Option<DateTime<Utc>>,
    pub current_assets: Vec<BalanceLine>,
    pub fixed_assets: Vec<BalanceLine>,
    pub current_liabilities: Vec<BalanceLine>,
    pub long_term_liabilities: Vec<BalanceLine>,
    pub equity: Vec<BalanceLine>,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    /// Net income of the open period, not yet closed into equity.
    pub current_earnings: Decimal,
    /// Equity account balances plus `current_earnings`.
    pub total_equity: Decimal,
}

impl BalanceSheet {
    pub fn is_balanced(&self) -> bool {
        self.total_liabilities
            .checked_add(self.total_equity)
            .map_or(false, |claims| claims == self.total_assets)
    }
}

pub struct ReportService;

impl ReportService {
    /// Profit & Loss over `transactions`, optionally restricted to `window`.
    /// Sums saturate at the decimal range.
    ///
    /// Each line is the effect of the postings on Revenue and Expense
    /// accounts. The category tag decides which line an effect lands on:
    /// sales-tagged revenue is `revenue`, other revenue is `other_income`,
    /// procurement-tagged expense is `cogs`, other expense is an operating
    /// expense of its account.
    pub fn profit_and_loss<'a, I>(
        accounts: &ChartOfAccounts,
        transactions: I,
        window: Option<DateWindow>,
    ) -> ProfitAndLoss
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut report = ProfitAndLoss {
            window,
            ..ProfitAndLoss::default()
        };

        let in_window = transactions
            .into_iter()
            .filter(|txn| window.map_or(true, |w| w.contains(txn.timestamp)));
        for txn in in_window {
            let sides = [
                (txn.debit_account_id.as_str(), Side::Debit),
                (txn.credit_account_id.as_str(), Side::Credit),
            ];
            for (id, side) in sides {
                let Some(account) = accounts.get(id) else {
                    continue;
                };
                let effect = account.delta_for(side, txn.amount);
                match account.category {
                    AccountCategory::Revenue => {
                        if txn.category == TransactionCategory::Sales {
                            report.revenue = report.revenue.saturating_add(effect);
                        } else {
                            report.other_income = report.other_income.saturating_add(effect);
                        }
                    }
                    AccountCategory::Expense => {
                        if txn.category == TransactionCategory::Procurement {
                            report.cogs = report.cogs.saturating_add(effect);
                        } else {
                            let line = report
                                .expenses
                                .entry(account.name.clone())
                                .or_insert(Decimal::ZERO);
                            *line = line.saturating_add(effect);
                        }
                    }
                    _ => {}
                }
            }
        }

        report.expenses.retain(|_, amount| !amount.is_zero());
        report.gross_profit = report.revenue.saturating_sub(report.cogs);
        report.total_op_expense = report
            .expenses
            .values()
            .fold(Decimal::ZERO, |sum, amount| sum.saturating_add(*amount));
        report.net_income = report
            .gross_profit
            .saturating_add(report.other_income)
            .saturating_sub(report.total_op_expense);
        report
    }

    /// Balance Sheet from current balances.
    ///
    /// `open_transactions` are the entries recorded after `closed_through`;
    /// their net income is reported as current earnings.
    pub fn balance_sheet(
        accounts: &ChartOfAccounts,
        open_transactions: &[Transaction],
        closed_through: Option<DateTime<Utc>>,
    ) -> BalanceSheet {
        use AccountCategory::{Asset, Equity, Liability};
        use AccountSubcategory::{Fixed, LongTerm};

        let current_assets = lines(accounts, Asset, |a| a.subcategory != Some(Fixed));
        let fixed_assets = lines(accounts, Asset, |a| a.subcategory == Some(Fixed));
        let current_liabilities = lines(accounts, Liability, |a| a.subcategory != Some(LongTerm));
        let long_term_liabilities = lines(accounts, Liability, |a| a.subcategory == Some(LongTerm));
        let equity = lines(accounts, Equity, |_| true);

        let current_earnings = Self::profit_and_loss(accounts, open_transactions, None).net_income;
        let total_equity = accounts
            .total(AccountCategory::Equity)
            .saturating_add(current_earnings);

        BalanceSheet {
            closed_through,
            total_assets: accounts.total(AccountCategory::Asset),
            total_liabilities: accounts.total(AccountCategory::Liability),
            current_earnings,
            total_equity,
            current_assets,
            fixed_assets,
            current_liabilities,
            long_term_liabilities,
            equity,
        }
    }
}

fn lines(
    accounts: &ChartOfAccounts,
    category: AccountCategory,
    keep: impl Fn(&Account) -> bool,
) -> Vec<BalanceLine> {
    accounts
        .list(&AccountFilter::category(category))
        .into_iter()
        .filter(|account| keep(account))
        .map(BalanceLine::from)
        .collect()
}
