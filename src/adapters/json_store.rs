use crate::adapters::memory_store::MemoryStore;
use crate::domain::model::{ConferenceRecord, Season, SeasonRef};
use crate::domain::ports::ConferenceStore;
use crate::utils::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One committed mutation, written as a single JSON line.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JournalEntry {
    Season(Season),
    Conference(ConferenceRecord),
}

/// `ConferenceStore` backed by a JSON snapshot plus an append-only journal.
///
/// Every mutating call appends one line to `<path>.journal` before it returns,
/// so rows applied before a failure stay committed and each write costs the
/// size of one record. `compact` (called from `flush` at the end of a run and
/// on `open`) folds the journal into the snapshot with a temp file + rename.
/// If an append fails, only that mutation is undone in memory.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    journal: Option<File>,
}

impl JsonFileStore {
    /// Opens the snapshot at `path`; a missing file starts an empty store.
    /// A journal left by an interrupted run is replayed and compacted.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = Self::load_snapshot(&path)?;
        let mut store = Self {
            path,
            inner,
            journal: None,
        };
        store.compact()?;

        tracing::debug!(
            "Opened store {} ({} seasons, {} conferences)",
            store.path.display(),
            store.inner.season_count(),
            store.inner.conference_count()
        );
        Ok(store)
    }

    /// Reads a snapshot and its journal without binding them to the file, e.g. for dry runs.
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<MemoryStore, StoreError> {
        let path = path.as_ref();
        let mut store = read_snapshot(path)?;

        let replayed = replay_journal(&journal_path(path), &mut store)?;
        if replayed > 0 {
            tracing::info!(
                "Replayed {} journal entries for {}",
                replayed,
                path.display()
            );
        }

        Ok(store)
    }

    /// Rewrites the snapshot from memory and drops the journal. No-op without a journal.
    pub fn compact(&mut self) -> Result<(), StoreError> {
        let journal_path = journal_path(&self.path);
        if self.journal.is_none() && !journal_path.exists() {
            return Ok(());
        }

        self.write_snapshot()?;
        self.journal = None;
        match fs::remove_file(&journal_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_snapshot(&self) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let json = serde_json::to_string_pretty(&self.inner)?;
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    fn append(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        if self.journal.is_none() {
            ensure_parent(&self.path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(journal_path(&self.path))?;
            self.journal = Some(file);
        }
        if let Some(journal) = self.journal.as_mut() {
            journal.write_all(&line)?;
        }

        Ok(())
    }
}

impl ConferenceStore for JsonFileStore {
    fn find_or_create_season(&mut self, year: &str) -> Result<SeasonRef, StoreError> {
        let season = self.inner.find_or_create_season(year)?;
        if !season.created {
            return Ok(season);
        }

        let entry = JournalEntry::Season(Season {
            id: season.id,
            name: year.to_string(),
        });
        if let Err(e) = self.append(&entry) {
            tracing::warn!("Failed to journal season {} in {}: {}", year, self.path.display(), e);
            self.inner.remove_season(year);
            return Err(e);
        }

        Ok(season)
    }

    fn find_or_initialize_conference(
        &mut self,
        gid: &str,
    ) -> Result<ConferenceRecord, StoreError> {
        self.inner.find_or_initialize_conference(gid)
    }

    fn save(&mut self, record: ConferenceRecord) -> Result<ConferenceRecord, StoreError> {
        let previous = self.inner.find_conference(&record.gid);
        let saved = self.inner.save(record)?;

        if let Err(e) = self.append(&JournalEntry::Conference(saved.clone())) {
            tracing::warn!(
                "Failed to journal conference {} in {}: {}",
                saved.gid,
                self.path.display(),
                e
            );
            self.inner.restore_conference(&saved.gid, previous);
            return Err(e);
        }

        Ok(saved)
    }

    fn find_conference(&self, gid: &str) -> Option<ConferenceRecord> {
        self.inner.find_conference(gid)
    }

    fn find_season(&self, year: &str) -> Option<Season> {
        self.inner.find_season(year)
    }

    fn conference_count(&self) -> usize {
        self.inner.conference_count()
    }

    fn season_count(&self) -> usize {
        self.inner.season_count()
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.compact()
    }
}

fn journal_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".journal");
    PathBuf::from(name)
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<MemoryStore, StoreError> {
    if !path.exists() {
        return Ok(MemoryStore::new());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(MemoryStore::new());
    }

    let mut store: MemoryStore = serde_json::from_str(&content)?;
    store.repair_sequences();
    Ok(store)
}

fn replay_journal(path: &Path, store: &mut MemoryStore) -> Result<usize, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut replayed = 0;
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalEntry>(line) {
            Ok(JournalEntry::Season(season)) => store.put_season(season),
            Ok(JournalEntry::Conference(record)) => store.put_conference(record),
            Err(e) => {
                // a crash mid-append leaves a torn last line
                tracing::warn!(
                    "Stopped replaying {} at line {}: {}",
                    path.display(),
                    index + 1,
                    e
                );
                break;
            }
        }
        replayed += 1;
    }

    Ok(replayed)
}
