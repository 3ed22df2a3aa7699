//! Budget plan administration and spend-to-limit status.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::{AccountRole, LedgerError};
use crate::ledger::{
    AccountCategory, AccountId, BudgetPeriod, BudgetPlan, BudgetStatus, Ledger, Transaction,
    TransactionKind,
};

use super::ServiceResult;

/// Fields a caller supplies when creating or replacing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDraft {
    pub account_id: AccountId,
    pub limit: Decimal,
    pub period: BudgetPeriod,
}

impl BudgetDraft {
    pub fn new(account_id: impl Into<AccountId>, limit: Decimal, period: BudgetPeriod) -> Self {
        Self {
            account_id: account_id.into(),
            limit,
            period,
        }
    }
}

pub struct BudgetService;

impl BudgetService {
    pub fn create_plan(ledger: &mut Ledger, draft: BudgetDraft) -> ServiceResult<BudgetPlan> {
        let account_name = Self::validate(ledger, &draft)?;
        let plan = BudgetPlan::new(draft.account_id, account_name, draft.limit, draft.period);
        ledger.budgets.push(plan.clone());
        ledger.touch();
        Ok(plan)
    }

    /// Replaces the plan identified by `id`, keeping its id.
    pub fn replace_plan(
        ledger: &mut Ledger,
        id: Uuid,
        draft: BudgetDraft,
    ) -> ServiceResult<BudgetPlan> {
        let index = Self::position(ledger, id)?;
        let account_name = Self::validate(ledger, &draft)?;
        let plan = BudgetPlan {
            id,
            account_id: draft.account_id,
            account_name,
            limit: draft.limit,
            period: draft.period,
        };
        ledger.budgets[index] = plan.clone();
        ledger.touch();
        Ok(plan)
    }

    pub fn remove_plan(ledger: &mut Ledger, id: Uuid) -> ServiceResult<BudgetPlan> {
        let index = Self::position(ledger, id)?;
        let removed = ledger.budgets.remove(index);
        ledger.touch();
        Ok(removed)
    }

    /// Spend-to-limit view of every plan for the period containing
    /// `reference_date`.
    ///
    /// Spent counts `Out` transactions that debit the plan's account; plans in
    /// an unbounded period count every such transaction. A reference date with
    /// no calendar window reports nothing spent.
    pub fn status(
        plans: &[BudgetPlan],
        transactions: &[Transaction],
        reference_date: NaiveDate,
    ) -> Vec<BudgetStatus> {
        plans
            .iter()
            .map(|plan| {
                let Ok(window) = plan.period.window_containing(reference_date) else {
                    return BudgetStatus::from_spent(plan.clone(), Decimal::ZERO);
                };
                let spent = transactions
                    .iter()
                    .filter(|txn| txn.kind == TransactionKind::Out)
                    .filter(|txn| txn.debit_account_id == plan.account_id)
                    .filter(|txn| window.map_or(true, |w| w.contains(txn.timestamp)))
                    .fold(Decimal::ZERO, |sum, txn| sum.saturating_add(txn.amount));
                BudgetStatus::from_spent(plan.clone(), spent)
            })
            .collect()
    }

    fn validate(ledger: &Ledger, draft: &BudgetDraft) -> ServiceResult<String> {
        if draft.limit <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(draft.limit));
        }
        let account = ledger
            .accounts
            .get(&draft.account_id)
            .ok_or_else(|| LedgerError::MissingAccount {
                role: AccountRole::Budget,
                id: draft.account_id.clone(),
            })?;
        if account.category != AccountCategory::Expense {
            return Err(LedgerError::BudgetAccountMismatch {
                id: account.id.clone(),
                category: account.category,
            });
        }
        Ok(account.name.clone())
    }

    fn position(ledger: &Ledger, id: Uuid) -> ServiceResult<usize> {
        ledger
            .budgets
            .iter()
            .position(|plan| plan.id == id)
            .ok_or_else(|| LedgerError::BudgetNotFound(id.to_string()))
    }
}
