//! Default chart of accounts and keyword rules for a new outlet.

use super::account::{Account, AccountCategory, AccountSubcategory, ChartOfAccounts};
use super::mapping::KeywordRule;
use super::transaction::TransactionKind;

pub const CASH: &str = "acc_cash";
pub const BANK_BCA: &str = "acc_bank_bca";
pub const RECEIVABLE: &str = "acc_receivable";
pub const INVENTORY: &str = "acc_inventory";
pub const EQUIPMENT: &str = "acc_equipment";
pub const PAYABLE: &str = "acc_payable";
pub const BANK_LOAN: &str = "acc_loan";
pub const CAPITAL: &str = "acc_capital";
pub const RETAINED_EARNINGS: &str = "acc_retained";
pub const SALES_REVENUE: &str = "acc_rev_sales";
pub const OTHER_INCOME: &str = "acc_rev_other";
pub const COGS: &str = "acc_cogs";
pub const SALARY: &str = "acc_exp_salary";
pub const UTILITY: &str = "acc_exp_utility";
pub const RENT: &str = "acc_exp_rent";
pub const MARKETING: &str = "acc_exp_marketing";
pub const DIGITAL_ADS: &str = "acc_exp_ads";
pub const OTHER_EXPENSE: &str = "acc_exp_other";

/// System accounts every outlet starts with, all at zero balance.
pub fn seed_chart() -> ChartOfAccounts {
    use AccountCategory::*;
    use AccountSubcategory::*;

    let entries = [
        (CASH, "1-1001", "Cash on Hand", Asset, Some(Current)),
        (BANK_BCA, "1-1002", "Bank BCA", Asset, Some(Current)),
        (RECEIVABLE, "1-1101", "Accounts Receivable", Asset, Some(Current)),
        (INVENTORY, "1-1201", "Merchandise Inventory", Asset, Some(Current)),
        (EQUIPMENT, "1-2001", "Store Equipment", Asset, Some(Fixed)),
        (PAYABLE, "2-1001", "Accounts Payable", Liability, Some(Current)),
        (BANK_LOAN, "2-2001", "Bank Loan", Liability, Some(LongTerm)),
        (CAPITAL, "3-1001", "Owner's Capital", Equity, None),
        (RETAINED_EARNINGS, "3-2001", "Retained Earnings", Equity, None),
        (SALES_REVENUE, "4-1001", "Sales Revenue", Revenue, None),
        (OTHER_INCOME, "4-9001", "Other Income", Revenue, None),
        (COGS, "5-1001", "Cost of Goods Sold", Expense, None),
        (SALARY, "6-1001", "Salary Expense", Expense, None),
        (UTILITY, "6-1002", "Electricity & Water", Expense, None),
        (RENT, "6-1003", "Rent Expense", Expense, None),
        (MARKETING, "6-1004", "Marketing Expense", Expense, None),
        (DIGITAL_ADS, "6-1005", "Digital Ads", Expense, None),
        (OTHER_EXPENSE, "6-9001", "Other Expense", Expense, None),
    ];

    entries
        .into_iter()
        .map(|(id, code, name, category, subcategory)| {
            let account = Account::new(id, code, name, category).system();
            match subcategory {
                Some(sub) => account.with_subcategory(sub),
                None => account,
            }
        })
        .collect()
}

/// Keyword rules matching the seeded chart.
pub fn seed_rules() -> Vec<KeywordRule> {
    use TransactionKind::{In, Out};

    [
        ("listrik", UTILITY, CASH, Out),
        ("token listrik", UTILITY, CASH, Out),
        ("pdam", UTILITY, CASH, Out),
        ("gaji", SALARY, CASH, Out),
        ("sewa", RENT, BANK_BCA, Out),
        ("ads", MARKETING, CASH, Out),
        ("iklan", MARKETING, CASH, Out),
        ("fb ads", DIGITAL_ADS, BANK_BCA, Out),
        ("beli bahan", COGS, CASH, Out),
        ("belanja", INVENTORY, CASH, Out),
        ("modal", CAPITAL, BANK_BCA, In),
        ("pinjaman", BANK_LOAN, BANK_BCA, In),
        ("jual", SALES_REVENUE, CASH, In),
        ("penjualan", SALES_REVENUE, CASH, In),
    ]
    .into_iter()
    .map(|(keyword, target, source, direction)| KeywordRule::new(keyword, target, source, direction))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mapping::KeywordMapper;

    #[test]
    fn seeded_chart_starts_balanced_and_protected() {
        let chart = seed_chart();
        assert!(chart.iter().all(|a| a.is_system && a.balance.is_zero()));
        assert_eq!(
            chart.get(BANK_LOAN).and_then(|a| a.subcategory),
            Some(AccountSubcategory::LongTerm)
        );
    }

    #[test]
    fn every_seed_rule_resolves_against_the_seed_chart() {
        let chart = seed_chart();
        for rule in seed_rules() {
            assert!(chart.contains(&rule.target_account_id), "{}", rule.keyword);
            assert!(chart.contains(&rule.source_account_id), "{}", rule.keyword);
        }
    }

    #[test]
    fn seed_rules_cover_common_notes() {
        let chart = seed_chart();
        let mapper = KeywordMapper::new(&seed_rules());
        let utility = mapper.suggest("beli token listrik", &chart).unwrap();
        assert_eq!(utility.target_account_id, UTILITY);
        assert_eq!(utility.source_account_id, CASH);

        let capital = mapper.suggest("modal suntikan", &chart).unwrap();
        assert_eq!(capital.target_account_id, CAPITAL);
        assert_eq!(capital.direction, TransactionKind::In);
    }
}
