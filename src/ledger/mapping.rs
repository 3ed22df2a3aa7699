//! Keyword rules that turn a free-text note into a suggested account pair.

use serde::{Deserialize, Serialize};

use super::account::{AccountId, ChartOfAccounts};
use super::transaction::TransactionKind;

/// Maps a note keyword onto a `(target, source, direction)` triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: String,
    pub target_account_id: AccountId,
    pub source_account_id: AccountId,
    pub direction: TransactionKind,
}

impl KeywordRule {
    /// Builds a rule; the keyword is trimmed and lower-cased.
    pub fn new(
        keyword: &str,
        target: impl Into<AccountId>,
        source: impl Into<AccountId>,
        direction: TransactionKind,
    ) -> Self {
        Self {
            keyword: keyword.trim().to_lowercase(),
            target_account_id: target.into(),
            source_account_id: source.into(),
            direction,
        }
    }
}

/// Pre-fill produced by a keyword match.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Suggestion {
    pub keyword: String,
    pub target_account_id: AccountId,
    pub source_account_id: AccountId,
    pub direction: TransactionKind,
}

/// Rules compiled into longest-keyword-first order, keywords trimmed and
/// lower-cased.
///
/// Equal-length keywords are ordered lexicographically so suggestions are
/// stable across runs.
#[derive(Debug, Clone, Default)]
pub struct KeywordMapper {
    rules: Vec<KeywordRule>,
}

impl KeywordMapper {
    pub fn new(rules: &[KeywordRule]) -> Self {
        let mut rules: Vec<KeywordRule> = rules
            .iter()
            .map(|rule| KeywordRule {
                keyword: rule.keyword.trim().to_lowercase(),
                ..rule.clone()
            })
            .filter(|rule| !rule.keyword.is_empty())
            .collect();
        rules.sort_by(|a, b| {
            b.keyword
                .chars()
                .count()
                .cmp(&a.keyword.chars().count())
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the most specific rule contained in `note` whose accounts all
    /// exist in `accounts`.
    pub fn suggest(&self, note: &str, accounts: &ChartOfAccounts) -> Option<Suggestion> {
        let haystack = note.trim().to_lowercase();
        if haystack.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .filter(|rule| haystack.contains(rule.keyword.as_str()))
            .find(|rule| {
                accounts.contains(&rule.target_account_id)
                    && accounts.contains(&rule.source_account_id)
            })
            .map(|rule| Suggestion {
                keyword: rule.keyword.clone(),
                target_account_id: rule.target_account_id.clone(),
                source_account_id: rule.source_account_id.clone(),
                direction: rule.direction,
            })
    }
}

/// An account picker's state in an entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Empty,
    Suggested(AccountId),
    Manual(AccountId),
}

impl Selection {
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Selection::Empty => None,
            Selection::Suggested(id) | Selection::Manual(id) => Some(id),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Selection::Manual(_))
    }
}

/// Entry form state that accepts suggestions without ever overriding a
/// manual choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    pub note: String,
    pub direction: Option<TransactionKind>,
    pub target: Selection,
    pub source: Selection,
    direction_manual: bool,
}

impl EntryDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose_target(&mut self, id: impl Into<AccountId>) {
        self.target = Selection::Manual(id.into());
    }

    pub fn choose_source(&mut self, id: impl Into<AccountId>) {
        self.source = Selection::Manual(id.into());
    }

    pub fn choose_direction(&mut self, direction: TransactionKind) {
        self.direction = Some(direction);
        self.direction_manual = true;
    }

    /// Updates the note and pre-fills every field the user has not chosen.
    /// Without a match nothing but the note changes.
    pub fn apply_note(
        &mut self,
        note: impl Into<String>,
        mapper: &KeywordMapper,
        accounts: &ChartOfAccounts,
    ) -> Option<Suggestion> {
        self.note = note.into();
        let suggestion = mapper.suggest(&self.note, accounts)?;
        if !self.target.is_manual() {
            self.target = Selection::Suggested(suggestion.target_account_id.clone());
        }
        if !self.source.is_manual() {
            self.source = Selection::Suggested(suggestion.source_account_id.clone());
        }
        if !self.direction_manual {
            self.direction = Some(suggestion.direction);
        }
        Some(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::{Account, AccountCategory};

    fn accounts() -> ChartOfAccounts {
        [
            Account::new("acc_cash", "1-1001", "Cash", AccountCategory::Asset),
            Account::new("acc_exp_ads", "6-1005", "Ads", AccountCategory::Expense),
            Account::new("acc_exp_marketing", "6-1004", "Marketing", AccountCategory::Expense),
            Account::new("acc_exp_utility", "6-1002", "Utility", AccountCategory::Expense),
        ]
        .into_iter()
        .collect()
    }

    fn mapper() -> KeywordMapper {
        KeywordMapper::new(&[
            KeywordRule::new("ads", "acc_exp_marketing", "acc_cash", TransactionKind::Out),
            KeywordRule::new("FB Ads", "acc_exp_ads", "acc_cash", TransactionKind::Out),
            KeywordRule::new("listrik", "acc_exp_utility", "acc_cash", TransactionKind::Out),
        ])
    }

    #[test]
    fn longer_keyword_wins() {
        let hit = mapper()
            .suggest("Bayar FB ads minggu ini", &accounts())
            .expect("match");
        assert_eq!(hit.keyword, "fb ads");
        assert_eq!(hit.target_account_id, "acc_exp_ads");
    }

    #[test]
    fn stored_rules_match_regardless_of_case() {
        let stored: KeywordRule = serde_json::from_value(serde_json::json!({
            "keyword": " FB Ads ",
            "target_account_id": "acc_exp_ads",
            "source_account_id": "acc_cash",
            "direction": "out",
        }))
        .unwrap();
        let hit = KeywordMapper::new(&[stored])
            .suggest("iklan fb ads", &accounts())
            .expect("match");
        assert_eq!(hit.keyword, "fb ads");
    }

    #[test]
    fn equal_length_ties_break_lexicographically() {
        let mapper = KeywordMapper::new(&[
            KeywordRule::new("sewa", "acc_exp_utility", "acc_cash", TransactionKind::Out),
            KeywordRule::new("gaji", "acc_exp_marketing", "acc_cash", TransactionKind::Out),
        ]);
        let hit = mapper.suggest("sewa dan gaji", &accounts()).unwrap();
        assert_eq!(hit.keyword, "gaji");
    }

    #[test]
    fn rules_with_missing_accounts_are_skipped() {
        let mapper = KeywordMapper::new(&[
            KeywordRule::new("token listrik", "acc_gone", "acc_cash", TransactionKind::Out),
            KeywordRule::new("listrik", "acc_exp_utility", "acc_cash", TransactionKind::Out),
        ]);
        let hit = mapper.suggest("beli token listrik", &accounts()).unwrap();
        assert_eq!(hit.keyword, "listrik");
    }

    #[test]
    fn empty_note_never_matches() {
        assert!(mapper().suggest("", &accounts()).is_none());
        assert!(mapper().suggest("   ", &accounts()).is_none());
        assert!(mapper().suggest("kopi", &accounts()).is_none());
    }

    #[test]
    fn draft_keeps_manual_choices() {
        let mut draft = EntryDraft::new();
        draft.choose_source("acc_bank_bca");
        draft.apply_note("fb ads", &mapper(), &accounts()).unwrap();

        assert_eq!(draft.target, Selection::Suggested("acc_exp_ads".into()));
        assert_eq!(draft.source, Selection::Manual("acc_bank_bca".into()));
        assert_eq!(draft.direction, Some(TransactionKind::Out));

        draft.choose_target("acc_exp_marketing");
        draft.apply_note("bayar listrik", &mapper(), &accounts());
        assert_eq!(draft.target.account_id(), Some("acc_exp_marketing"));
    }

    #[test]
    fn draft_untouched_without_match() {
        let mut draft = EntryDraft::new();
        draft.apply_note("listrik", &mapper(), &accounts());
        let before = draft.clone();
        assert!(draft.apply_note("kopi susu", &mapper(), &accounts()).is_none());
        assert_eq!(draft.target, before.target);
        assert_eq!(draft.source, before.source);
        assert_eq!(draft.note, "kopi susu");
    }
}
