use crate::domain::model::{ConferenceRecord, Season, SeasonRef};
use crate::domain::ports::ConferenceStore;
use crate::utils::error::StoreError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-memory store. Also the snapshot format of `JsonFileStore`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    seasons: BTreeMap<String, Season>,
    conferences: BTreeMap<String, ConferenceRecord>,
    #[serde(default)]
    next_season_id: u64,
    #[serde(default)]
    next_conference_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Snapshots written by hand may omit the counters.
    pub(crate) fn repair_sequences(&mut self) {
        let max_season = self.seasons.values().map(|s| s.id).max().unwrap_or(0);
        let max_conference = self
            .conferences
            .values()
            .filter_map(|c| c.id)
            .max()
            .unwrap_or(0);
        self.next_season_id = self.next_season_id.max(max_season);
        self.next_conference_id = self.next_conference_id.max(max_conference);
    }

    /// Inserts an already committed season as is, e.g. when replaying a journal.
    pub(crate) fn put_season(&mut self, season: Season) {
        self.next_season_id = self.next_season_id.max(season.id);
        self.seasons.insert(season.name.clone(), season);
    }

    /// Inserts an already committed record as is, replacing any record with the same gid.
    pub(crate) fn put_conference(&mut self, record: ConferenceRecord) {
        if let Some(id) = record.id {
            self.next_conference_id = self.next_conference_id.max(id);
        }
        self.conferences.insert(record.gid.clone(), record);
    }

    pub(crate) fn remove_season(&mut self, name: &str) {
        self.seasons.remove(name);
    }

    /// Puts back the record `gid` had before a save, or drops it if there was none.
    pub(crate) fn restore_conference(&mut self, gid: &str, previous: Option<ConferenceRecord>) {
        match previous {
            Some(record) => {
                self.conferences.insert(gid.to_string(), record);
            }
            None => {
                self.conferences.remove(gid);
            }
        }
    }
}

impl ConferenceStore for MemoryStore {
    fn find_or_create_season(&mut self, year: &str) -> Result<SeasonRef, StoreError> {
        if year.trim().is_empty() {
            return Err(StoreError::validation("season name", "can't be blank"));
        }

        if let Some(season) = self.seasons.get(year) {
            return Ok(SeasonRef {
                id: season.id,
                created: false,
            });
        }

        self.next_season_id += 1;
        let season = Season {
            id: self.next_season_id,
            name: year.to_string(),
        };
        self.seasons.insert(year.to_string(), season);

        Ok(SeasonRef {
            id: self.next_season_id,
            created: true,
        })
    }

    fn find_or_initialize_conference(
        &mut self,
        gid: &str,
    ) -> Result<ConferenceRecord, StoreError> {
        Ok(self
            .conferences
            .get(gid)
            .cloned()
            .unwrap_or_else(|| ConferenceRecord::new(gid)))
    }

    fn save(&mut self, mut record: ConferenceRecord) -> Result<ConferenceRecord, StoreError> {
        record.validate()?;

        if let Some(season_id) = record.season_id {
            if !self.seasons.values().any(|s| s.id == season_id) {
                return Err(StoreError::validation(
                    "season",
                    format!("{} does not exist", season_id),
                ));
            }
        }

        let now = Utc::now();
        match record.id {
            None => {
                if self.conferences.contains_key(&record.gid) {
                    return Err(StoreError::Conflict { gid: record.gid });
                }
                self.next_conference_id += 1;
                record.id = Some(self.next_conference_id);
                record.created_at = Some(now);
            }
            Some(id) => match self.conferences.get(&record.gid) {
                Some(existing) if existing.id == Some(id) => {
                    record.created_at = existing.created_at;
                }
                _ => {
                    return Err(StoreError::validation(
                        "id",
                        format!("{} does not match a stored conference '{}'", id, record.gid),
                    ))
                }
            },
        }
        record.updated_at = Some(now);

        self.conferences.insert(record.gid.clone(), record.clone());
        Ok(record)
    }

    fn find_conference(&self, gid: &str) -> Option<ConferenceRecord> {
        self.conferences.get(gid).cloned()
    }

    fn find_season(&self, year: &str) -> Option<Season> {
        self.seasons.get(year).cloned()
    }

    fn conference_count(&self) -> usize {
        self.conferences.len()
    }

    fn season_count(&self) -> usize {
        self.seasons.len()
    }
}
