use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use fintrack_core::{storage::RecordStore, CoreError, WriteBatch};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

const FILE_EXTENSION: &str = "json";
const DATA_FILE_STEM: &str = "fintrack";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Where the data document and its backups live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_file: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// Standard layout below `dir`: `fintrack.json` plus a `backups/` folder.
    pub fn under(dir: &Path) -> Self {
        Self {
            data_file: dir.join(format!("{DATA_FILE_STEM}.{FILE_EXTENSION}")),
            backup_root: dir.join("backups"),
        }
    }
}

/// Describes a persisted backup of the data document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    collections: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    scalars: BTreeMap<String, Decimal>,
}

/// Filesystem-backed [`RecordStore`] keeping every collection and scalar in one
/// JSON document.
///
/// Each write replaces the whole file through a temporary sibling and a rename,
/// so a [`WriteBatch`] lands on disk all at once or not at all.
#[derive(Debug)]
pub struct JsonRecordStore {
    paths: StoragePaths,
    retention: usize,
    lock: Mutex<()>,
}

impl JsonRecordStore {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        if let Some(parent) = paths.data_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
            lock: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Copies the current document into the backup folder and prunes old copies.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let _guard = self.guard();
        let document = self.read_document()?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", self.slug(), timestamp);
        if let Some(label) = sanitize_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let (file_name, path) = self.free_backup_path(&stem);
        let data = serialize_document(&document)?;
        write_atomic(&path, &data)?;
        info!(backup = %file_name, "Data backup written");
        self.prune_backups()?;
        Ok(BackupInfo {
            created_at: parse_backup_timestamp(&file_name),
            size_bytes: data.len() as u64,
            id: file_name,
            path,
        })
    }

    /// Backups for this document, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        let dir = &self.paths.backup_root;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", self.slug());
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if !file_name.starts_with(&prefix) {
                continue;
            }
            entries.push(BackupInfo {
                id: file_name.to_string(),
                created_at: parse_backup_timestamp(file_name),
                size_bytes: fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0),
                path: path.clone(),
            });
        }
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    /// Replaces the live document with the contents of `backup`.
    pub fn restore_backup(&self, backup: &BackupInfo) -> Result<(), CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let _guard = self.guard();
        let document = read_document_at(&backup.path)?;
        write_atomic(&self.paths.data_file, &serialize_document(&document)?)?;
        info!(backup = %backup.id, "Data restored from backup");
        Ok(())
    }

    /// First unused `<stem>[_NN].json` in the backup folder.
    fn free_backup_path(&self, stem: &str) -> (String, PathBuf) {
        let mut file_name = format!("{stem}.{FILE_EXTENSION}");
        let mut counter = 1;
        while self.paths.backup_root.join(&file_name).exists() {
            counter += 1;
            file_name = format!("{stem}_{counter:02}.{FILE_EXTENSION}");
        }
        let path = self.paths.backup_root.join(&file_name);
        (file_name, path)
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&stale.path) {
                warn!(backup = %stale.id, error = %err, "Could not prune backup");
            }
        }
        Ok(())
    }

    fn slug(&self) -> String {
        let stem = self
            .paths
            .data_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(DATA_FILE_STEM);
        canonical_name(stem)
    }

    fn read_document(&self) -> Result<Document, CoreError> {
        if !self.paths.data_file.exists() {
            debug!(path = %self.paths.data_file.display(), "No data file yet");
            return Ok(Document::default());
        }
        read_document_at(&self.paths.data_file)
    }

    fn write_document(&self, document: &Document) -> Result<(), CoreError> {
        write_atomic(&self.paths.data_file, &serialize_document(document)?)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for JsonRecordStore {
    fn load(&self, collection: &str) -> Result<Vec<Value>, CoreError> {
        let _guard = self.guard();
        Ok(self
            .read_document()?
            .collections
            .remove(collection)
            .unwrap_or_default())
    }

    fn save(&self, collection: &str, records: Vec<Value>) -> Result<(), CoreError> {
        let mut batch = WriteBatch::new();
        batch.put_collection(collection, records);
        self.commit(batch)
    }

    fn load_scalar(&self, key: &str) -> Result<Option<Decimal>, CoreError> {
        let _guard = self.guard();
        Ok(self.read_document()?.scalars.get(key).copied())
    }

    fn save_scalar(&self, key: &str, value: Decimal) -> Result<(), CoreError> {
        let mut batch = WriteBatch::new();
        batch.put_scalar(key, value);
        self.commit(batch)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), CoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self.guard();
        let mut document = self.read_document()?;
        let (collections, scalars) = batch.into_parts();
        document.collections.extend(collections);
        document.scalars.extend(scalars);
        self.write_document(&document)
    }
}

fn read_document_at(path: &Path) -> Result<Document, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| {
        CoreError::Serde(format!("{}: {err}", path.display()))
    })
}

fn serialize_document(document: &Document) -> Result<String, CoreError> {
    serde_json::to_string_pretty(document).map_err(CoreError::from)
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '-',
        })
        .collect();
    if sanitized.trim_matches('-').is_empty() {
        DATA_FILE_STEM.into()
    } else {
        sanitized
    }
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Finds the `YYYYMMDD_HHMMSS` pair inside a backup file name.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{FILE_EXTENSION}"))?;
    let segments: Vec<&str> = trimmed.split('_').collect();
    segments.windows(2).find_map(|pair| {
        if !is_digits(pair[0], 8) || !is_digits(pair[1], 6) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", pair[0], pair[1]), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` to a temporary sibling, syncs it, then renames it over `path`.
fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_timestamp_is_found_with_or_without_note() {
        let plain = parse_backup_timestamp("fintrack_20240315_093000.json").expect("plain");
        assert_eq!(plain.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 09:30:00");
        assert!(parse_backup_timestamp("fintrack_20240315_093000_before-import.json").is_some());
        assert!(parse_backup_timestamp("fintrack_notes.json").is_none());
    }

    #[test]
    fn notes_are_slugged() {
        assert_eq!(
            sanitize_note(Some("  Before Import!! v2 ")),
            Some("before-import-v2".to_string())
        );
        assert_eq!(sanitize_note(Some("***")), None);
        assert_eq!(sanitize_note(None), None);
    }

    #[test]
    fn colliding_backup_names_get_a_counter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonRecordStore::new(StoragePaths::under(dir.path())).expect("store");
        let stem = "fintrack_20240315_093000_nightly";

        let (first, first_path) = store.free_backup_path(stem);
        assert_eq!(first, "fintrack_20240315_093000_nightly.json");
        fs::write(&first_path, "{}").expect("write");

        let (second, second_path) = store.free_backup_path(stem);
        assert_eq!(second, "fintrack_20240315_093000_nightly_02.json");
        fs::write(&second_path, "{}").expect("write");
        assert_eq!(store.free_backup_path(stem).0, "fintrack_20240315_093000_nightly_03.json");

        let ids: Vec<String> = store
            .list_backups()
            .expect("list")
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn tmp_path_keeps_original_extension() {
        let tmp = tmp_path(Path::new("/data/fintrack.json"));
        assert_eq!(tmp, PathBuf::from("/data/fintrack.json.tmp"));
    }
}
