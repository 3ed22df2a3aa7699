use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;

/// User-facing direction of a cash movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    In,
    Out,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::In => f.write_str("in"),
            TransactionKind::Out => f.write_str("out"),
        }
    }
}

/// Coarse reporting classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionCategory {
    Sales,
    Procurement,
    Salary,
    Operational,
    #[default]
    Other,
}

impl TransactionCategory {
    pub fn label(self) -> &'static str {
        match self {
            TransactionCategory::Sales => "sales",
            TransactionCategory::Procurement => "procurement",
            TransactionCategory::Salary => "salary",
            TransactionCategory::Operational => "operational",
            TransactionCategory::Other => "other",
        }
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A posted ledger entry. Recording and posting are one step, so every
/// stored transaction has already moved both account balances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub debit_account_id: AccountId,
    #[serde(default)]
    pub credit_account_id: AccountId,
    #[serde(default)]
    pub category: TransactionCategory,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
}

impl Transaction {
    /// Legacy simple in/out records that never named their accounts.
    pub fn is_unattributed(&self) -> bool {
        self.debit_account_id.is_empty() && self.credit_account_id.is_empty()
    }

    pub fn touches(&self, account_id: &str) -> bool {
        self.debit_account_id == account_id || self.credit_account_id == account_id
    }
}

/// Request to record a cash movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    pub amount: Decimal,
    pub kind: TransactionKind,
    /// The expense/asset being paid for (`Out`) or the revenue/equity/liability
    /// the money comes from (`In`).
    pub target_account_id: AccountId,
    /// Where money leaves from (`Out`) or lands (`In`). Defaults to cash.
    pub source_account_id: Option<AccountId>,
    pub category: TransactionCategory,
    pub note: String,
    pub attachment: Option<String>,
    pub staff_name: Option<String>,
    pub ref_id: Option<String>,
}

impl RecordInput {
    pub fn new(amount: Decimal, kind: TransactionKind, target: impl Into<AccountId>) -> Self {
        Self {
            amount,
            kind,
            target_account_id: target.into(),
            source_account_id: None,
            category: TransactionCategory::Other,
            note: String::new(),
            attachment: None,
            staff_name: None,
            ref_id: None,
        }
    }

    pub fn money_in(amount: Decimal, target: impl Into<AccountId>) -> Self {
        Self::new(amount, TransactionKind::In, target)
    }

    pub fn money_out(amount: Decimal, target: impl Into<AccountId>) -> Self {
        Self::new(amount, TransactionKind::Out, target)
    }

    pub fn with_source(mut self, source: impl Into<AccountId>) -> Self {
        self.source_account_id = Some(source.into());
        self
    }

    pub fn with_category(mut self, category: TransactionCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_staff(mut self, staff_name: impl Into<String>) -> Self {
        self.staff_name = Some(staff_name.into());
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    pub fn with_ref(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }
}

/// Maps the in/out toggle onto the `(debit, credit)` account pair.
pub fn posting_sides<'a>(
    kind: TransactionKind,
    target: &'a str,
    source: &'a str,
) -> (&'a str, &'a str) {
    match kind {
        TransactionKind::Out => (target, source),
        TransactionKind::In => (source, target),
    }
}
