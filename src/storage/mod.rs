pub mod json_backend;
pub mod memory;

use crate::{
    errors::{LedgerError, Result},
    ledger::{Account, Ledger, Transaction, CURRENT_SCHEMA_VERSION},
};

/// Abstraction over persistence backends that hold one ledger per outlet.
pub trait StorageBackend: Send + Sync {
    /// Returns `None` when nothing has been stored for `outlet` yet.
    fn load_outlet(&self, outlet: &str) -> Result<Option<Ledger>>;
    fn save_outlet(&self, ledger: &Ledger) -> Result<()>;
    /// Persists one posting: the new transaction and the two accounts it
    /// moved, as they look after the posting.
    fn append_posting(&self, outlet: &str, transaction: &Transaction, accounts: &[Account])
        -> Result<()>;
    /// Ids of every stored outlet, as recorded in the documents.
    fn list_outlets(&self) -> Result<Vec<String>>;
}

/// Rejects ledgers written by a newer schema.
pub fn check_schema(ledger: &Ledger) -> Result<()> {
    if ledger.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(LedgerError::Persistence(format!(
            "outlet `{}` uses schema version {} but only {} is supported",
            ledger.outlet_id, ledger.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(())
}

/// Applies a persisted posting onto a stored ledger document.
pub(crate) fn patch_posting(
    ledger: &mut Ledger,
    transaction: &Transaction,
    accounts: &[Account],
) -> Result<()> {
    if let Some(missing) = accounts.iter().find(|a| !ledger.accounts.contains(&a.id)) {
        return Err(LedgerError::Persistence(format!(
            "stored outlet `{}` has no account `{}`",
            ledger.outlet_id, missing.id
        )));
    }
    if ledger.transaction(transaction.id).is_some() {
        return Err(LedgerError::Persistence(format!(
            "transaction {} already stored",
            transaction.id
        )));
    }
    for account in accounts {
        ledger.accounts.insert(account.clone());
    }
    ledger.transactions.push(transaction.clone());
    ledger.touch();
    Ok(())
}

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;
