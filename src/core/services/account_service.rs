//! Chart of accounts lookups and administration.

use crate::errors::LedgerError;
use crate::ledger::{Account, AccountFilter, Ledger};

use super::ServiceResult;

pub struct AccountService;

impl AccountService {
    pub fn get<'a>(ledger: &'a Ledger, id: &str) -> ServiceResult<&'a Account> {
        ledger
            .accounts
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    pub fn list<'a>(ledger: &'a Ledger, filter: &AccountFilter) -> Vec<&'a Account> {
        ledger.accounts.list(filter)
    }

    /// Adds an account. New accounts always start at a zero balance so the
    /// accounting equation is unaffected.
    pub fn add(ledger: &mut Ledger, mut account: Account) -> ServiceResult<()> {
        let id = account.id.trim().to_string();
        if id.is_empty() {
            return Err(LedgerError::InvalidAccount("account id must not be blank".into()));
        }
        if ledger.accounts.contains(&id) {
            return Err(LedgerError::DuplicateAccount(id));
        }
        let code = account.code.trim().to_string();
        if let Some(existing) = ledger.accounts.iter().find(|a| a.code == code) {
            return Err(LedgerError::DuplicateAccount(format!(
                "{} (code {} used by {})",
                id, code, existing.id
            )));
        }
        account.id = id;
        account.code = code;
        account.balance = rust_decimal::Decimal::ZERO;
        ledger.accounts.insert(account);
        ledger.touch();
        Ok(())
    }

    pub fn remove(ledger: &mut Ledger, id: &str) -> ServiceResult<Account> {
        let account = Self::get(ledger, id)?;
        if account.is_system {
            return Err(LedgerError::ProtectedAccount(id.to_string()));
        }
        if ledger.is_account_referenced(id) || !account.balance.is_zero() {
            return Err(LedgerError::AccountInUse(id.to_string()));
        }
        let removed = ledger
            .accounts
            .remove(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        ledger.touch();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{seed, AccountCategory, BudgetPeriod, BudgetPlan};
    use rust_decimal::Decimal;

    fn custom_account() -> Account {
        Account::new("acc_exp_parking", "6-1010", "Parking", AccountCategory::Expense)
    }

    #[test]
    fn add_rejects_duplicate_id_and_code() {
        let mut ledger = Ledger::seeded("main");
        AccountService::add(&mut ledger, custom_account()).unwrap();

        let err = AccountService::add(&mut ledger, custom_account()).expect_err("duplicate id");
        assert!(matches!(err, LedgerError::DuplicateAccount(_)));

        let clash = Account::new("acc_other", "6-1010", "Other", AccountCategory::Expense);
        let err = AccountService::add(&mut ledger, clash).expect_err("duplicate code");
        assert!(matches!(err, LedgerError::DuplicateAccount(ref msg) if msg.contains("6-1010")));
    }

    #[test]
    fn add_rejects_blank_id() {
        let mut ledger = Ledger::seeded("main");
        let count = ledger.accounts.len();
        let blank = Account::new("   ", "6-1011", "Blank", AccountCategory::Expense);
        let err = AccountService::add(&mut ledger, blank).expect_err("blank id");
        assert!(matches!(err, LedgerError::InvalidAccount(_)));
        assert_eq!(ledger.accounts.len(), count);
    }

    #[test]
    fn add_resets_balance_to_zero() {
        let mut ledger = Ledger::seeded("main");
        let mut account = custom_account();
        account.balance = Decimal::from(999);
        AccountService::add(&mut ledger, account).unwrap();
        assert!(AccountService::get(&ledger, "acc_exp_parking")
            .unwrap()
            .balance
            .is_zero());
    }

    #[test]
    fn system_accounts_cannot_be_removed() {
        let mut ledger = Ledger::seeded("main");
        let err = AccountService::remove(&mut ledger, seed::CASH).expect_err("protected");
        assert!(matches!(err, LedgerError::ProtectedAccount(_)));
    }

    #[test]
    fn referenced_accounts_cannot_be_removed() {
        let mut ledger = Ledger::seeded("main");
        AccountService::add(&mut ledger, custom_account()).unwrap();
        ledger.budgets.push(BudgetPlan::new(
            "acc_exp_parking",
            "Parking",
            Decimal::from(100),
            BudgetPeriod::Monthly,
        ));
        let err = AccountService::remove(&mut ledger, "acc_exp_parking").expect_err("in use");
        assert!(matches!(err, LedgerError::AccountInUse(_)));

        ledger.budgets.clear();
        let removed = AccountService::remove(&mut ledger, "acc_exp_parking").unwrap();
        assert_eq!(removed.name, "Parking");
        assert!(matches!(
            AccountService::get(&ledger, "acc_exp_parking"),
            Err(LedgerError::NotFound(_))
        ));
    }
}
