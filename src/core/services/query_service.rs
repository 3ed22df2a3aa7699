//! Read-only transaction lookups. Results are always most recent first.

use crate::ledger::{DateWindow, Transaction};

pub struct QueryService;

impl QueryService {
    /// Case-insensitive substring match over note and category label. A blank
    /// term behaves like [`QueryService::recent`].
    pub fn search<'a>(transactions: &'a [Transaction], term: &str, limit: usize) -> Vec<&'a Transaction> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Self::recent(transactions, limit);
        }
        let mut hits = newest_first(transactions.iter().filter(|txn| {
            txn.note.to_lowercase().contains(&needle) || txn.category.label().contains(&needle)
        }));
        hits.truncate(limit);
        hits
    }

    pub fn recent(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
        let mut all = newest_first(transactions.iter());
        all.truncate(limit);
        all
    }

    /// Transactions that debit or credit `account_id`. Legacy records without
    /// accounts are treated as cash movements of `default_cash`.
    pub fn by_account<'a>(
        transactions: &'a [Transaction],
        account_id: &str,
        default_cash: &str,
    ) -> Vec<&'a Transaction> {
        let include_unattributed = account_id == default_cash;
        newest_first(transactions.iter().filter(|txn| {
            txn.touches(account_id) || (include_unattributed && txn.is_unattributed())
        }))
    }

    pub fn in_window(transactions: &[Transaction], window: DateWindow) -> Vec<&Transaction> {
        newest_first(
            transactions
                .iter()
                .filter(|txn| window.contains(txn.timestamp)),
        )
    }
}

/// Sorts by timestamp descending; equal timestamps keep the later insertion
/// first.
fn newest_first<'a>(iter: impl DoubleEndedIterator<Item = &'a Transaction>) -> Vec<&'a Transaction> {
    let mut out: Vec<&Transaction> = iter.rev().collect();
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out
}
