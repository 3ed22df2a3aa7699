//! Posting of cash movements and period close.
//!
//! Recording is split into [`TransactionService::prepare`], which validates
//! the request and stages both balance deltas without touching the ledger,
//! and [`TransactionService::apply`], which commits a staged posting. The
//! manager persists between the two steps so a storage failure leaves the
//! in-memory ledger untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::{Builder, Uuid, Variant, Version};

use crate::errors::{AccountRole, LedgerError};
use crate::ledger::account::shifted;
use crate::ledger::{
    posting_sides, Account, AccountCategory, AccountId, Ledger, PeriodClose, RecordInput, Side,
    Transaction,
};

use super::ServiceResult;

/// Ambient values a posting needs besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct PostingContext<'a> {
    pub now: DateTime<Utc>,
    pub default_cash_account: &'a str,
}

/// A validated posting that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub transaction: Transaction,
    /// Signed balance change per account, debit side first.
    pub deltas: Vec<(AccountId, Decimal)>,
    /// Both accounts as they will look once the posting is applied.
    pub accounts: Vec<Account>,
}

pub struct TransactionService;

impl TransactionService {
    /// Validates `input` and stages its postings.
    ///
    /// Checks run in a fixed order: amount, target, source, distinct
    /// accounts, then balance range.
    pub fn prepare(
        ledger: &Ledger,
        input: RecordInput,
        ctx: PostingContext<'_>,
    ) -> ServiceResult<Posting> {
        if input.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(input.amount));
        }

        let target_id = input.target_account_id.trim().to_string();
        let source_id = input
            .source_account_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(ctx.default_cash_account)
            .to_string();

        if !ledger.accounts.contains(&target_id) {
            return Err(LedgerError::MissingAccount {
                role: AccountRole::Target,
                id: target_id,
            });
        }
        if !ledger.accounts.contains(&source_id) {
            return Err(LedgerError::MissingAccount {
                role: AccountRole::Source,
                id: source_id,
            });
        }
        if target_id == source_id {
            return Err(LedgerError::SameAccount(target_id));
        }

        let (debit_id, credit_id) = posting_sides(input.kind, &target_id, &source_id);
        let mut accounts = Vec::with_capacity(2);
        let mut deltas = Vec::with_capacity(2);
        for (id, side) in [(debit_id, Side::Debit), (credit_id, Side::Credit)] {
            let mut account = ledger
                .accounts
                .get(id)
                .cloned()
                .ok_or_else(|| LedgerError::UnknownAccount(id.to_string()))?;
            let delta = account.delta_for(side, input.amount);
            account.balance = shifted(&account, delta)?;
            deltas.push((account.id.clone(), delta));
            accounts.push(account);
        }

        let transaction = Transaction {
            id: time_ordered_id(ctx.now, ledger.transactions.last().map(|txn| txn.id)),
            timestamp: ctx.now,
            amount: input.amount,
            kind: input.kind,
            debit_account_id: debit_id.to_string(),
            credit_account_id: credit_id.to_string(),
            category: input.category,
            note: input.note.trim().to_string(),
            attachment: input.attachment,
            staff_name: input.staff_name,
            ref_id: input.ref_id,
        };

        Ok(Posting {
            transaction,
            deltas,
            accounts,
        })
    }

    /// Commits a staged posting: both balances move and the transaction is
    /// appended, or nothing changes.
    pub fn apply(ledger: &mut Ledger, posting: Posting) -> ServiceResult<Transaction> {
        ledger.accounts.apply_deltas(&posting.deltas)?;
        ledger.transactions.push(posting.transaction.clone());
        ledger.touch();
        Ok(posting.transaction)
    }

    pub fn record(
        ledger: &mut Ledger,
        input: RecordInput,
        ctx: PostingContext<'_>,
    ) -> ServiceResult<Transaction> {
        let posting = Self::prepare(ledger, input, ctx)?;
        Self::apply(ledger, posting)
    }

    /// Rolls every Revenue and Expense balance into `retained_account_id` and
    /// zeroes them.
    pub fn close_period(
        ledger: &mut Ledger,
        at: DateTime<Utc>,
        retained_account_id: &str,
    ) -> ServiceResult<PeriodClose> {
        if let Some(previous) = ledger.closed_through() {
            if at < previous {
                return Err(LedgerError::InvalidPeriod(format!(
                    "close at {} precedes previous close at {}",
                    at, previous
                )));
            }
        }
        if let Some(latest) = ledger.transactions.iter().map(|t| t.timestamp).max() {
            if at < latest {
                return Err(LedgerError::InvalidPeriod(format!(
                    "close at {} precedes latest transaction at {}",
                    at, latest
                )));
            }
        }
        let retained = ledger.accounts.get(retained_account_id).ok_or_else(|| {
            LedgerError::MissingAccount {
                role: AccountRole::RetainedEarnings,
                id: retained_account_id.to_string(),
            }
        })?;
        if retained.category != AccountCategory::Equity {
            return Err(LedgerError::InvalidPeriod(format!(
                "retained earnings account `{}` is {}, expected EQUITY",
                retained.id, retained.category
            )));
        }

        let mut deltas: Vec<(AccountId, Decimal)> = ledger
            .accounts
            .iter()
            .filter(|account| account.category.is_nominal() && !account.balance.is_zero())
            .map(|account| (account.id.clone(), -account.balance))
            .collect();
        let revenue = ledger.accounts.total(AccountCategory::Revenue);
        let net_income = revenue
            .checked_sub(ledger.accounts.total(AccountCategory::Expense))
            .ok_or_else(|| LedgerError::BalanceOverflow {
                id: retained_account_id.to_string(),
                amount: revenue,
            })?;
        if !net_income.is_zero() {
            deltas.push((retained_account_id.to_string(), net_income));
        }
        ledger.accounts.apply_deltas(&deltas)?;

        let close = PeriodClose {
            closed_at: at,
            transaction_count: ledger.transactions.len(),
            net_income,
            retained_account_id: retained_account_id.to_string(),
        };
        ledger.closes.push(close.clone());
        ledger.touch();
        Ok(close)
    }
}

/// UUID v7 derived from the posting time so ids sort with the ledger.
///
/// Postings in the same millisecond as `previous` count up from it, so ids
/// also follow insertion order. Pre-epoch times share millisecond zero.
fn time_ordered_id(at: DateTime<Utc>, previous: Option<Uuid>) -> Uuid {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    let random = Uuid::new_v4().into_bytes();
    let mut tail = [0u8; 10];
    tail.copy_from_slice(&random[6..]);
    let candidate = Builder::from_unix_timestamp_millis(millis, &tail).into_uuid();

    match previous {
        Some(last) if last.as_bytes()[..6] == candidate.as_bytes()[..6] && last >= candidate => {
            let next = last.as_u128().wrapping_add(1).to_be_bytes();
            Builder::from_bytes(next)
                .with_version(Version::SortRand)
                .with_variant(Variant::RFC4122)
                .into_uuid()
        }
        _ => candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{seed, AccountCategory, TransactionCategory, TransactionKind};
    use chrono::{Duration, TimeZone};

    fn ctx() -> PostingContext<'static> {
        PostingContext {
            now: Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap(),
            default_cash_account: seed::CASH,
        }
    }

    fn balance(ledger: &Ledger, id: &str) -> Decimal {
        ledger.accounts.get(id).unwrap().balance
    }

    fn funded_ledger() -> Ledger {
        let mut ledger = Ledger::seeded("main");
        TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::from(1_000_000), seed::CAPITAL),
            ctx(),
        )
        .unwrap();
        ledger
    }

    #[test]
    fn utility_payment_debits_expense_and_credits_cash() {
        let mut ledger = funded_ledger();
        let txn = TransactionService::record(
            &mut ledger,
            RecordInput::money_out(Decimal::from(50_000), seed::UTILITY)
                .with_note("token listrik")
                .with_category(TransactionCategory::Operational),
            ctx(),
        )
        .unwrap();

        assert_eq!(txn.debit_account_id, seed::UTILITY);
        assert_eq!(txn.credit_account_id, seed::CASH);
        assert_eq!(balance(&ledger, seed::UTILITY), Decimal::from(50_000));
        assert_eq!(balance(&ledger, seed::CASH), Decimal::from(950_000));
    }

    #[test]
    fn capital_injection_debits_bank_and_credits_capital() {
        let mut ledger = Ledger::seeded("main");
        let txn = TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::from(5_000_000), seed::CAPITAL)
                .with_source(seed::BANK_BCA)
                .with_note("modal awal"),
            ctx(),
        )
        .unwrap();

        assert_eq!(txn.kind, TransactionKind::In);
        assert_eq!(txn.debit_account_id, seed::BANK_BCA);
        assert_eq!(txn.credit_account_id, seed::CAPITAL);
        assert_eq!(balance(&ledger, seed::BANK_BCA), Decimal::from(5_000_000));
        assert_eq!(balance(&ledger, seed::CAPITAL), Decimal::from(5_000_000));
    }

    #[test]
    fn source_defaults_to_cash() {
        let mut ledger = Ledger::seeded("main");
        let txn = TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::from(10), seed::SALES_REVENUE).with_source("  "),
            ctx(),
        )
        .unwrap();
        assert_eq!(txn.debit_account_id, seed::CASH);
    }

    #[test]
    fn validation_order_is_amount_target_source_same() {
        let ledger = Ledger::seeded("main");
        let zero = RecordInput::money_out(Decimal::ZERO, "acc_ghost");
        assert!(matches!(
            TransactionService::prepare(&ledger, zero, ctx()),
            Err(LedgerError::InvalidAmount(_))
        ));

        let ghost = RecordInput::money_out(Decimal::ONE, "acc_ghost").with_source("acc_void");
        assert!(matches!(
            TransactionService::prepare(&ledger, ghost, ctx()),
            Err(LedgerError::MissingAccount { role: AccountRole::Target, .. })
        ));

        let void = RecordInput::money_out(Decimal::ONE, seed::RENT).with_source("acc_void");
        assert!(matches!(
            TransactionService::prepare(&ledger, void, ctx()),
            Err(LedgerError::MissingAccount { role: AccountRole::Source, ref id }) if id == "acc_void"
        ));

        let same = RecordInput::money_out(Decimal::ONE, seed::CASH);
        assert!(matches!(
            TransactionService::prepare(&ledger, same, ctx()),
            Err(LedgerError::SameAccount(_))
        ));
    }

    #[test]
    fn rejected_posting_leaves_ledger_untouched() {
        let mut ledger = funded_ledger();
        let before = ledger.accounts.clone();
        let count = ledger.transactions.len();

        let err = TransactionService::record(
            &mut ledger,
            RecordInput::money_out(Decimal::from(20), "acc_unknown"),
            ctx(),
        )
        .expect_err("unknown target");
        assert!(matches!(err, LedgerError::MissingAccount { .. }));
        assert_eq!(ledger.accounts, before);
        assert_eq!(ledger.transactions.len(), count);
    }

    #[test]
    fn prepare_does_not_mutate_and_projects_balances() {
        let ledger = funded_ledger();
        let posting = TransactionService::prepare(
            &ledger,
            RecordInput::money_out(Decimal::from(300), seed::RENT),
            ctx(),
        )
        .unwrap();

        assert_eq!(balance(&ledger, seed::RENT), Decimal::ZERO);
        assert_eq!(posting.accounts[0].balance, Decimal::from(300));
        assert_eq!(posting.accounts[1].balance, Decimal::from(1_000_000 - 300));
        let net: Decimal = posting
            .accounts
            .iter()
            .zip(&posting.deltas)
            .map(|(account, (_, delta))| match account.category.normal_side() {
                Side::Debit => *delta,
                Side::Credit => -*delta,
            })
            .sum();
        assert_eq!(net, Decimal::ZERO, "debits must equal credits");
    }

    #[test]
    fn ids_follow_posting_time() {
        let mut ledger = Ledger::seeded("main");
        let first = TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::ONE, seed::SALES_REVENUE),
            ctx(),
        )
        .unwrap();
        let later = PostingContext {
            now: ctx().now + Duration::seconds(5),
            ..ctx()
        };
        let second = TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::ONE, seed::SALES_REVENUE),
            later,
        )
        .unwrap();
        assert_eq!(first.id.get_version_num(), 7);
        assert!(first.id < second.id);
    }

    #[test]
    fn ids_in_the_same_instant_follow_insertion_order() {
        let mut ledger = Ledger::seeded("main");
        let before_epoch = PostingContext {
            now: Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 0).unwrap(),
            ..ctx()
        };
        for context in [ctx(), before_epoch] {
            let ids: Vec<Uuid> = (0..5)
                .map(|_| {
                    TransactionService::record(
                        &mut ledger,
                        RecordInput::money_in(Decimal::ONE, seed::SALES_REVENUE),
                        context,
                    )
                    .unwrap()
                    .id
                })
                .collect();
            assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", ids);
            assert!(ids.iter().all(|id| id.get_version_num() == 7));
        }
    }

    #[test]
    fn posting_past_the_decimal_range_is_rejected() {
        let mut ledger = Ledger::seeded("main");
        TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::MAX, seed::CAPITAL),
            ctx(),
        )
        .unwrap();
        let before = ledger.accounts.clone();

        let err = TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::MAX, seed::CAPITAL),
            ctx(),
        )
        .expect_err("cash cannot exceed the decimal range");
        assert!(matches!(err, LedgerError::BalanceOverflow { ref id, .. } if id == seed::CASH));
        assert_eq!(ledger.accounts, before);
        assert_eq!(ledger.transactions.len(), 1);
    }

    #[test]
    fn close_period_moves_nominal_balances_into_retained_earnings() {
        let mut ledger = funded_ledger();
        TransactionService::record(
            &mut ledger,
            RecordInput::money_in(Decimal::from(200_000), seed::SALES_REVENUE)
                .with_category(TransactionCategory::Sales),
            ctx(),
        )
        .unwrap();
        TransactionService::record(
            &mut ledger,
            RecordInput::money_out(Decimal::from(80_000), seed::COGS)
                .with_category(TransactionCategory::Procurement),
            ctx(),
        )
        .unwrap();

        let close = TransactionService::close_period(
            &mut ledger,
            ctx().now + Duration::hours(1),
            seed::RETAINED_EARNINGS,
        )
        .unwrap();

        assert_eq!(close.net_income, Decimal::from(120_000));
        assert_eq!(close.transaction_count, 3);
        assert_eq!(balance(&ledger, seed::RETAINED_EARNINGS), Decimal::from(120_000));
        assert!(ledger
            .accounts
            .iter()
            .filter(|a| a.category.is_nominal())
            .all(|a| a.balance.is_zero()));
        assert!(ledger.open_transactions().is_empty());
    }

    #[test]
    fn close_period_rejects_going_backwards() {
        let mut ledger = funded_ledger();
        let err = TransactionService::close_period(
            &mut ledger,
            ctx().now - Duration::minutes(1),
            seed::RETAINED_EARNINGS,
        )
        .expect_err("before latest transaction");
        assert!(matches!(err, LedgerError::InvalidPeriod(_)));

        let at = ctx().now + Duration::days(1);
        TransactionService::close_period(&mut ledger, at, seed::RETAINED_EARNINGS).unwrap();
        let err = TransactionService::close_period(
            &mut ledger,
            at - Duration::hours(1),
            seed::RETAINED_EARNINGS,
        )
        .expect_err("before previous close");
        assert!(matches!(err, LedgerError::InvalidPeriod(_)));
    }

    #[test]
    fn close_period_requires_an_equity_account() {
        let mut ledger = funded_ledger();
        let at = ctx().now + Duration::days(1);
        assert!(matches!(
            TransactionService::close_period(&mut ledger, at, seed::CASH),
            Err(LedgerError::InvalidPeriod(_))
        ));
        assert!(matches!(
            TransactionService::close_period(&mut ledger, at, "acc_ghost"),
            Err(LedgerError::MissingAccount {
                role: AccountRole::RetainedEarnings,
                ..
            })
        ));
        assert_eq!(
            ledger.accounts.get(seed::CASH).unwrap().category,
            AccountCategory::Asset
        );
    }
}
