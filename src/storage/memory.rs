use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use crate::{
    errors::{LedgerError, Result},
    ledger::{Account, Ledger, Transaction},
};

use super::{patch_posting, StorageBackend};

/// In-process storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    outlets: Mutex<HashMap<String, Ledger>>,
    fail_next_write: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `save_outlet` or `append_posting` fail once.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Copy of the stored document for `outlet`.
    pub fn stored(&self, outlet: &str) -> Option<Ledger> {
        self.lock().get(outlet).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Ledger>> {
        self.outlets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Persistence("simulated write failure".into()));
        }
        Ok(())
    }
}

impl StorageBackend for MemoryStorage {
    fn load_outlet(&self, outlet: &str) -> Result<Option<Ledger>> {
        Ok(self.stored(outlet))
    }

    fn save_outlet(&self, ledger: &Ledger) -> Result<()> {
        self.check_write()?;
        self.lock().insert(ledger.outlet_id.clone(), ledger.clone());
        Ok(())
    }

    fn append_posting(
        &self,
        outlet: &str,
        transaction: &Transaction,
        accounts: &[Account],
    ) -> Result<()> {
        self.check_write()?;
        let mut outlets = self.lock();
        let stored = outlets.get_mut(outlet).ok_or_else(|| {
            LedgerError::Persistence(format!("outlet `{}` has not been saved", outlet))
        })?;
        patch_posting(stored, transaction, accounts)
    }

    fn list_outlets(&self) -> Result<Vec<String>> {
        let mut outlets: Vec<String> = self.lock().keys().cloned().collect();
        outlets.sort();
        Ok(outlets)
    }
}
