use crate::domain::model::{Applied, ConferenceRow, RowFailure, UpsertAction};
use crate::domain::ports::ConferenceStore;
use crate::utils::error::RowError;

/// Upserts parsed rows into a `ConferenceStore`, one row at a time.
pub struct Reconciler<'a, S: ConferenceStore + ?Sized> {
    store: &'a mut S,
    seasons_created: usize,
}

impl<'a, S: ConferenceStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            seasons_created: 0,
        }
    }

    /// Seasons created so far. A season stays created even when the row that
    /// asked for it fails afterwards.
    pub fn seasons_created(&self) -> usize {
        self.seasons_created
    }

    /// Applies one row. Every error is converted into a `RowFailure` for that row.
    pub fn upsert(&mut self, row: &ConferenceRow) -> Result<Applied, RowFailure> {
        self.apply(row)
            .map_err(|e| RowFailure::new(row.line, row.uid.as_str(), e))
    }

    fn apply(&mut self, row: &ConferenceRow) -> Result<Applied, RowError> {
        let season_key = row.uid.season_key()?;
        let season = self.store.find_or_create_season(season_key.as_str())?;
        if season.created {
            self.seasons_created += 1;
            tracing::debug!("Created season {} (id {})", season_key, season.id);
        }

        let mut record = self.store.find_or_initialize_conference(row.uid.as_str())?;
        let action = if record.is_new() {
            UpsertAction::Created
        } else {
            UpsertAction::Updated
        };

        record.assign(row.fields.clone(), season.id);
        let saved = self.store.save(record)?;

        tracing::debug!(
            "{:?} conference {} (id {:?}) in season {}",
            action,
            saved.gid,
            saved.id,
            season_key
        );

        Ok(Applied {
            line: row.line,
            uid: saved.gid,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::domain::model::{ConferenceFields, ConferenceUid};
    use crate::utils::error::StoreError;

    fn row(line: u64, uid: &str, name: &str) -> ConferenceRow {
        ConferenceRow {
            line,
            uid: ConferenceUid::parse(uid).unwrap(),
            fields: ConferenceFields {
                name: Some(name.to_string()),
                starts_on: Some("01 09 2017".to_string()),
                ends_on: Some("02 09 2017".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_upsert_creates_then_updates() {
        let mut store = MemoryStore::new();
        let mut reconciler = Reconciler::new(&mut store);

        let first = reconciler.upsert(&row(2, "2017001", "Foo")).unwrap();
        assert_eq!(first.action, UpsertAction::Created);
        assert_eq!(reconciler.seasons_created(), 1);

        let second = reconciler.upsert(&row(2, "2017001", "FooUpdated")).unwrap();
        assert_eq!(second.action, UpsertAction::Updated);
        assert_eq!(reconciler.seasons_created(), 1);

        assert_eq!(store.conference_count(), 1);
        assert_eq!(store.season_count(), 1);
        let record = store.find_conference("2017001").unwrap();
        assert_eq!(record.fields.name.as_deref(), Some("FooUpdated"));
        assert_eq!(record.season_id, store.find_season("2017").map(|s| s.id));
    }

    #[test]
    fn test_upsert_groups_by_year_prefix() {
        let mut store = MemoryStore::new();
        let mut reconciler = Reconciler::new(&mut store);

        for (line, uid) in [(2, "2018002"), (3, "2017001"), (4, "2018001"), (5, "2017002")] {
            reconciler.upsert(&row(line, uid, "Conf")).unwrap();
        }

        assert_eq!(store.season_count(), 2);
        assert_eq!(store.conference_count(), 4);
    }

    #[test]
    fn test_non_numeric_prefix_is_malformed_and_skips_store() {
        let mut store = MemoryStore::new();
        let mut reconciler = Reconciler::new(&mut store);

        let failure = reconciler.upsert(&row(7, "X017001", "Bad")).unwrap_err();
        assert_eq!(failure.line, 7);
        assert_eq!(failure.uid, "X017001");
        assert!(failure.error.is_malformed());

        assert_eq!(store.season_count(), 0);
        assert_eq!(store.conference_count(), 0);
    }

    #[test]
    fn test_store_rejection_becomes_storage_write_failure() {
        let mut store = MemoryStore::new();
        let mut reconciler = Reconciler::new(&mut store);

        let mut bad = row(3, "2017003", "Bad dates");
        bad.fields.starts_on = Some("2017-09-01".to_string());

        let failure = reconciler.upsert(&bad).unwrap_err();
        assert!(matches!(
            failure.error,
            RowError::StorageWrite(StoreError::Validation { .. })
        ));
        // the season was committed before the save was rejected
        assert_eq!(reconciler.seasons_created(), 1);
        assert_eq!(store.conference_count(), 0);
        assert_eq!(store.season_count(), 1);
    }
}
