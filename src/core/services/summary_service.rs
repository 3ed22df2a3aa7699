//! Running cash-flow totals.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::services::ReportService;
use crate::ledger::{ChartOfAccounts, DateWindow, Transaction, TransactionKind};

/// Money in, money out, and profit over a window.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CashflowTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net_cashflow: Decimal,
    pub net_profit: Decimal,
}

pub struct SummaryService;

impl SummaryService {
    pub fn totals(
        transactions: &[Transaction],
        accounts: &ChartOfAccounts,
        window: Option<DateWindow>,
    ) -> CashflowTotals {
        let mut totals = CashflowTotals::default();
        for txn in transactions
            .iter()
            .filter(|txn| window.map_or(true, |w| w.contains(txn.timestamp)))
        {
            match txn.kind {
                TransactionKind::In => totals.income = totals.income.saturating_add(txn.amount),
                TransactionKind::Out => totals.expense = totals.expense.saturating_add(txn.amount),
            }
        }
        totals.net_cashflow = totals.income.saturating_sub(totals.expense);
        totals.net_profit = ReportService::profit_and_loss(accounts, transactions, window).net_income;
        totals
    }
}
