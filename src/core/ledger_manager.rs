use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::core::services::{
    AccountService, BalanceSheet, BudgetDraft, BudgetService, CashflowTotals, MappingService,
    PostingContext, ProfitAndLoss, QueryService, ReportService, SummaryService,
    TransactionService,
};
use crate::core::time::{Clock, SystemClock};
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    Account, AccountFilter, BudgetPlan, BudgetStatus, DateWindow, KeywordMapper, KeywordRule,
    Ledger, PeriodClose, RecordInput, Suggestion, Transaction,
};
use crate::storage::{check_schema, JsonStorage, StorageBackend};

/// Outcome of loading an outlet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMetadata {
    pub outlet_id: String,
    pub warnings: Vec<String>,
    /// `true` when the outlet did not exist and was created from the seed.
    pub seeded: bool,
    pub schema_version: u8,
}

struct OutletState {
    ledger: Ledger,
    mapper: KeywordMapper,
    load: LoadMetadata,
}

impl OutletState {
    fn new(ledger: Ledger, load: LoadMetadata) -> Self {
        Self {
            mapper: KeywordMapper::new(&ledger.rules),
            ledger,
            load,
        }
    }
}

/// Facade that owns the active outlet's ledger and coordinates postings,
/// projections, and persistence.
///
/// Every write holds the write lock from validation through persistence to
/// the in-memory update, so concurrent postings serialize. Reads project
/// from one consistent state under the read lock.
pub struct LedgerManager {
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
    config: Config,
    state: RwLock<OutletState>,
}

impl LedgerManager {
    /// Opens `config.active_outlet`, seeding it on first use.
    pub fn open(storage: Box<dyn StorageBackend>, config: Config) -> Result<Self> {
        Self::with_clock(storage, Box::new(SystemClock), config)
    }

    pub fn with_clock(
        storage: Box<dyn StorageBackend>,
        clock: Box<dyn Clock>,
        config: Config,
    ) -> Result<Self> {
        let (ledger, load) = load_or_seed(storage.as_ref(), &config.active_outlet)?;
        Ok(Self {
            storage,
            clock,
            config,
            state: RwLock::new(OutletState::new(ledger, load)),
        })
    }

    /// Opens the active outlet from JSON files under the configured data root.
    pub fn from_config(config: Config) -> Result<Self> {
        let storage = JsonStorage::new(
            Some(config.resolve_data_root()),
            Some(config.backup_retention),
        )?;
        Self::open(Box::new(storage), config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn outlet_id(&self) -> String {
        self.read().ledger.outlet_id.clone()
    }

    pub fn load_metadata(&self) -> LoadMetadata {
        self.read().load.clone()
    }

    pub fn list_outlets(&self) -> Result<Vec<String>> {
        self.storage.list_outlets()
    }

    /// Makes `outlet` the active outlet. The current outlet stays active if
    /// loading fails.
    pub fn switch_outlet(&self, outlet: &str) -> Result<LoadMetadata> {
        let mut state = self.write();
        let (ledger, load) = load_or_seed(self.storage.as_ref(), outlet)?;
        info!(outlet = %ledger.outlet_id, "switched active outlet");
        *state = OutletState::new(ledger, load.clone());
        Ok(load)
    }

    /// Records a cash movement on the active outlet.
    pub fn record(&self, input: RecordInput) -> Result<Transaction> {
        let mut state = self.write();
        let ctx = PostingContext {
            now: self.clock.now(),
            default_cash_account: &self.config.default_cash_account,
        };
        let posting = TransactionService::prepare(&state.ledger, input, ctx).map_err(|err| {
            warn!(outlet = %state.ledger.outlet_id, error = %err, "posting rejected");
            err
        })?;
        self.storage
            .append_posting(&state.ledger.outlet_id, &posting.transaction, &posting.accounts)
            .map_err(|err| {
                warn!(outlet = %state.ledger.outlet_id, error = %err, "posting not persisted");
                err
            })?;
        let txn = TransactionService::apply(&mut state.ledger, posting)?;
        info!(
            outlet = %state.ledger.outlet_id,
            id = %txn.id,
            amount = %txn.amount,
            debit = %txn.debit_account_id,
            credit = %txn.credit_account_id,
            "transaction posted"
        );
        Ok(txn)
    }

    /// Closes the open period at the current time.
    pub fn close_period(&self) -> Result<PeriodClose> {
        self.close_period_at(self.clock.now())
    }

    pub fn close_period_at(&self, at: DateTime<Utc>) -> Result<PeriodClose> {
        let retained = self.config.retained_earnings_account.clone();
        let close = self.mutate(|ledger| TransactionService::close_period(ledger, at, &retained))?;
        info!(
            closed_at = %close.closed_at,
            net_income = %close.net_income,
            "period closed"
        );
        Ok(close)
    }

    pub fn account(&self, id: &str) -> Result<Account> {
        AccountService::get(&self.read().ledger, id).cloned()
    }

    pub fn accounts(&self, filter: &AccountFilter) -> Vec<Account> {
        AccountService::list(&self.read().ledger, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn profit_and_loss(&self, window: Option<DateWindow>) -> ProfitAndLoss {
        let state = self.read();
        ReportService::profit_and_loss(&state.ledger.accounts, &state.ledger.transactions, window)
    }

    pub fn balance_sheet(&self) -> BalanceSheet {
        let state = self.read();
        ReportService::balance_sheet(
            &state.ledger.accounts,
            state.ledger.open_transactions(),
            state.ledger.closed_through(),
        )
    }

    /// Budget status for the periods containing `reference_date`, or today.
    pub fn budget_status(&self, reference_date: Option<NaiveDate>) -> Vec<BudgetStatus> {
        let date = reference_date.unwrap_or_else(|| self.clock.today());
        let state = self.read();
        BudgetService::status(&state.ledger.budgets, &state.ledger.transactions, date)
    }

    pub fn search(&self, term: &str, limit: Option<usize>) -> Vec<Transaction> {
        let limit = limit.unwrap_or(self.config.search_limit);
        let state = self.read();
        cloned(QueryService::search(&state.ledger.transactions, term, limit))
    }

    pub fn recent(&self, limit: Option<usize>) -> Vec<Transaction> {
        let limit = limit.unwrap_or(self.config.recent_limit);
        let state = self.read();
        cloned(QueryService::recent(&state.ledger.transactions, limit))
    }

    pub fn by_account(&self, account_id: &str) -> Vec<Transaction> {
        let state = self.read();
        cloned(QueryService::by_account(
            &state.ledger.transactions,
            account_id,
            &self.config.default_cash_account,
        ))
    }

    pub fn in_window(&self, window: DateWindow) -> Vec<Transaction> {
        let state = self.read();
        cloned(QueryService::in_window(&state.ledger.transactions, window))
    }

    pub fn totals(&self, window: Option<DateWindow>) -> CashflowTotals {
        let state = self.read();
        SummaryService::totals(&state.ledger.transactions, &state.ledger.accounts, window)
    }

    pub fn suggest(&self, note: &str) -> Option<Suggestion> {
        let state = self.read();
        MappingService::suggest(&state.mapper, &state.ledger, note)
    }

    /// Keyword mapper compiled from the active outlet's rules.
    pub fn mapper(&self) -> KeywordMapper {
        self.read().mapper.clone()
    }

    /// Consistent copy of the active ledger.
    pub fn snapshot(&self) -> Ledger {
        self.read().ledger.clone()
    }

    pub fn add_account(&self, account: Account) -> Result<()> {
        self.mutate(|ledger| AccountService::add(ledger, account))
    }

    pub fn remove_account(&self, id: &str) -> Result<Account> {
        self.mutate(|ledger| AccountService::remove(ledger, id))
    }

    pub fn create_budget(&self, draft: BudgetDraft) -> Result<BudgetPlan> {
        self.mutate(|ledger| BudgetService::create_plan(ledger, draft))
    }

    pub fn replace_budget(&self, id: Uuid, draft: BudgetDraft) -> Result<BudgetPlan> {
        self.mutate(|ledger| BudgetService::replace_plan(ledger, id, draft))
    }

    pub fn remove_budget(&self, id: Uuid) -> Result<BudgetPlan> {
        self.mutate(|ledger| BudgetService::remove_plan(ledger, id))
    }

    pub fn add_rule(&self, rule: KeywordRule) -> Result<()> {
        self.mutate(|ledger| MappingService::add_rule(ledger, rule))
    }

    pub fn remove_rule(&self, keyword: &str) -> Result<KeywordRule> {
        self.mutate(|ledger| MappingService::remove_rule(ledger, keyword))
    }

    /// Applies `op` to a copy of the ledger, persists the copy, then swaps it
    /// in. Any failure leaves the active ledger as it was.
    fn mutate<T>(&self, op: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let mut state = self.write();
        let mut draft = state.ledger.clone();
        let value = op(&mut draft)?;
        self.storage.save_outlet(&draft)?;
        state.mapper = KeywordMapper::new(&draft.rules);
        state.ledger = draft;
        Ok(value)
    }

    fn read(&self) -> RwLockReadGuard<'_, OutletState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, OutletState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_or_seed(storage: &dyn StorageBackend, outlet: &str) -> Result<(Ledger, LoadMetadata)> {
    let outlet = outlet.trim();
    if outlet.is_empty() {
        return Err(LedgerError::Persistence("outlet id must not be empty".into()));
    }
    match storage.load_outlet(outlet)? {
        Some(ledger) => {
            check_schema(&ledger)?;
            let warnings = ledger.warnings();
            for warning in &warnings {
                warn!(outlet = %ledger.outlet_id, "{}", warning);
            }
            let load = LoadMetadata {
                outlet_id: ledger.outlet_id.clone(),
                warnings,
                seeded: false,
                schema_version: ledger.schema_version,
            };
            Ok((ledger, load))
        }
        None => {
            let ledger = Ledger::seeded(outlet);
            storage.save_outlet(&ledger)?;
            info!(outlet = %outlet, "seeded new outlet");
            let load = LoadMetadata {
                outlet_id: ledger.outlet_id.clone(),
                warnings: Vec::new(),
                seeded: true,
                schema_version: ledger.schema_version,
            };
            Ok((ledger, load))
        }
    }
}

fn cloned(transactions: Vec<&Transaction>) -> Vec<Transaction> {
    transactions.into_iter().cloned().collect()
}
