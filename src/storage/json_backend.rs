use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, PathResolver},
    errors::{LedgerError, Result},
    ledger::{Account, Ledger, Transaction},
};

use super::{patch_posting, StorageBackend};

const LEDGER_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// One pretty-printed JSON document per outlet under `<root>/outlets/`.
///
/// File names are slugs of the outlet id, so two ids can map onto one file.
/// A document only ever serves the outlet id stored inside it.
///
/// Full saves copy the previous document into `<root>/backups/<outlet>/`
/// first; postings rewrite the document in place. Every write goes through a
/// temp file and a rename.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    outlets_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let outlets_dir = PathResolver::outlet_dir_in(&app_root);
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&outlets_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root: app_root,
            outlets_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn outlet_path(&self, outlet: &str) -> PathBuf {
        self.outlets_dir
            .join(format!("{}.{}", canonical_name(outlet), LEDGER_EXTENSION))
    }

    fn backup_dir(&self, outlet: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(outlet))
    }

    /// Backup file names for `outlet`, newest first.
    pub fn list_backups(&self, outlet: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(outlet);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    pub fn backup_path(&self, outlet: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(outlet).join(backup_name)
    }

    fn backup_existing_file(&self, outlet: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(outlet);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup_name = format!("{}_{}.{}", canonical_name(outlet), timestamp, LEDGER_EXTENSION);
        fs::copy(path, dir.join(backup_name))?;
        self.prune_backups(outlet)
    }

    fn prune_backups(&self, outlet: &str) -> Result<()> {
        let backups = self.list_backups(outlet)?;
        for entry in backups.iter().skip(self.retention) {
            let _ = fs::remove_file(self.backup_path(outlet, entry));
        }
        Ok(())
    }

    fn read_document(&self, path: &Path) -> Result<Ledger> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn read_owner(&self, path: &Path) -> Result<String> {
        let data = fs::read_to_string(path)?;
        let header: DocumentHeader = serde_json::from_str(&data)?;
        Ok(header.outlet_id)
    }

    fn write_document(&self, ledger: &Ledger, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        let tmp = tmp_path(path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn load_outlet(&self, outlet: &str) -> Result<Option<Ledger>> {
        let path = self.outlet_path(outlet);
        if !path.exists() {
            return Ok(None);
        }
        let ledger = self.read_document(&path)?;
        ensure_owner(&ledger.outlet_id, outlet, &path)?;
        Ok(Some(ledger))
    }

    fn save_outlet(&self, ledger: &Ledger) -> Result<()> {
        let path = self.outlet_path(&ledger.outlet_id);
        if path.exists() {
            ensure_owner(&self.read_owner(&path)?, &ledger.outlet_id, &path)?;
        }
        self.backup_existing_file(&ledger.outlet_id, &path)?;
        self.write_document(ledger, &path)
    }

    fn append_posting(
        &self,
        outlet: &str,
        transaction: &Transaction,
        accounts: &[Account],
    ) -> Result<()> {
        let path = self.outlet_path(outlet);
        if !path.exists() {
            return Err(LedgerError::Persistence(format!(
                "outlet `{}` has not been saved",
                outlet
            )));
        }
        let mut stored = self.read_document(&path)?;
        ensure_owner(&stored.outlet_id, outlet, &path)?;
        patch_posting(&mut stored, transaction, accounts)?;
        self.write_document(&stored, &path)
    }

    /// Outlet ids as stored inside each document.
    fn list_outlets(&self) -> Result<Vec<String>> {
        let mut outlets = Vec::new();
        for entry in fs::read_dir(&self.outlets_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            outlets.push(self.read_owner(&path)?);
        }
        outlets.sort();
        Ok(outlets)
    }
}

#[derive(Deserialize)]
struct DocumentHeader {
    outlet_id: String,
}

fn ensure_owner(stored: &str, requested: &str, path: &Path) -> Result<()> {
    if stored != requested {
        return Err(LedgerError::Persistence(format!(
            "{} belongs to outlet `{}`, not `{}`",
            path.display(),
            stored,
            requested
        )));
    }
    Ok(())
}

/// File-safe slug for an outlet id.
pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches(|c| c == '_' || c == '-').is_empty() {
        "outlet".into()
    } else {
        sanitized
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(".json")?;
    let mut parts = stem.rsplitn(3, '_');
    let time_part = parts.next()?;
    let date_part = parts.next()?;
    if !is_digits(date_part, 8) || !is_digits(time_part, 4) {
        return None;
    }
    let raw = format!("{}{}", date_part, time_part);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
