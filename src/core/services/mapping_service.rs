//! Keyword rule administration and note-based suggestions.

use tracing::debug;

use crate::errors::{AccountRole, LedgerError};
use crate::ledger::{KeywordMapper, KeywordRule, Ledger, Suggestion};

use super::ServiceResult;

pub struct MappingService;

impl MappingService {
    /// Looks up a pre-fill for `note` against the ledger's current chart.
    pub fn suggest(mapper: &KeywordMapper, ledger: &Ledger, note: &str) -> Option<Suggestion> {
        let suggestion = mapper.suggest(note, &ledger.accounts);
        match &suggestion {
            Some(hit) => debug!(
                keyword = %hit.keyword,
                target = %hit.target_account_id,
                source = %hit.source_account_id,
                "keyword suggestion matched"
            ),
            None => debug!(note_len = note.len(), "no keyword suggestion"),
        }
        suggestion
    }

    pub fn add_rule(ledger: &mut Ledger, rule: KeywordRule) -> ServiceResult<()> {
        let rule = KeywordRule::new(
            &rule.keyword,
            rule.target_account_id,
            rule.source_account_id,
            rule.direction,
        );
        if rule.keyword.is_empty() {
            return Err(LedgerError::InvalidRule("keyword must not be empty".into()));
        }
        if ledger.rules.iter().any(|r| r.keyword == rule.keyword) {
            return Err(LedgerError::InvalidRule(format!(
                "keyword `{}` already mapped",
                rule.keyword
            )));
        }
        for id in [&rule.target_account_id, &rule.source_account_id] {
            if !ledger.accounts.contains(id) {
                return Err(LedgerError::MissingAccount {
                    role: AccountRole::Rule,
                    id: id.clone(),
                });
            }
        }
        if rule.target_account_id == rule.source_account_id {
            return Err(LedgerError::SameAccount(rule.target_account_id));
        }
        ledger.rules.push(rule);
        ledger.touch();
        Ok(())
    }

    pub fn remove_rule(ledger: &mut Ledger, keyword: &str) -> ServiceResult<KeywordRule> {
        let needle = keyword.trim().to_lowercase();
        let index = ledger
            .rules
            .iter()
            .position(|r| r.keyword == needle)
            .ok_or_else(|| LedgerError::InvalidRule(format!("keyword `{}` is not mapped", needle)))?;
        let removed = ledger.rules.remove(index);
        ledger.touch();
        Ok(removed)
    }
}
