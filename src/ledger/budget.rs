use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;
use super::period::BudgetPeriod;

/// A spending guardrail for a single expense account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetPlan {
    pub id: Uuid,
    pub account_id: AccountId,
    pub account_name: String,
    pub limit: Decimal,
    #[serde(default)]
    pub period: BudgetPeriod,
}

impl BudgetPlan {
    pub fn new(
        account_id: impl Into<AccountId>,
        account_name: impl Into<String>,
        limit: Decimal,
        period: BudgetPeriod,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            account_name: account_name.into(),
            limit,
            period,
        }
    }
}

/// Derived spend-to-limit view of a [`BudgetPlan`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub plan: BudgetPlan,
    pub spent: Decimal,
    /// `limit - spent`; negative when over budget.
    pub remaining: Decimal,
    /// Display percentage, clamped to `0..=100`.
    pub percent: Decimal,
    pub raw_percent: Decimal,
    pub over_budget: bool,
}

impl BudgetStatus {
    /// Arithmetic saturates at the decimal range instead of failing.
    pub fn from_spent(plan: BudgetPlan, spent: Decimal) -> Self {
        let raw_percent = if plan.limit > Decimal::ZERO {
            spent
                .checked_div(plan.limit)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map_or(Decimal::MAX, |percent| percent.round_dp(2))
        } else {
            Decimal::ZERO
        };
        let remaining = plan.limit.saturating_sub(spent);
        Self {
            spent,
            remaining,
            percent: raw_percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            raw_percent,
            over_budget: remaining < Decimal::ZERO,
            plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(limit: i64) -> BudgetPlan {
        BudgetPlan::new("acc_exp_rent", "Rent", Decimal::from(limit), BudgetPeriod::Monthly)
    }

    #[test]
    fn huge_spend_saturates_instead_of_panicking() {
        let status = BudgetStatus::from_spent(plan(1), Decimal::MAX / Decimal::TWO);
        assert_eq!(status.raw_percent, Decimal::MAX);
        assert_eq!(status.percent, Decimal::ONE_HUNDRED);
        assert!(status.over_budget);

        let status = BudgetStatus::from_spent(
            BudgetPlan::new("acc_exp_rent", "Rent", Decimal::MIN, BudgetPeriod::Monthly),
            Decimal::MAX,
        );
        assert_eq!(status.remaining, Decimal::MIN);
    }
}
