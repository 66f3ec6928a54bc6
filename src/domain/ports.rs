use crate::domain::model::{ConferenceRecord, Season, SeasonRef};
use crate::utils::error::StoreError;

/// Persistence collaborator for the importer.
pub trait ConferenceStore {
    /// Atomically returns the season named `year`, creating it on first use.
    fn find_or_create_season(&mut self, year: &str) -> Result<SeasonRef, StoreError>;

    /// Returns the stored record for `gid`, or a new unsaved record bound to it.
    fn find_or_initialize_conference(&mut self, gid: &str)
        -> Result<ConferenceRecord, StoreError>;

    /// Creates the record if it has no id yet, otherwise updates it.
    fn save(&mut self, record: ConferenceRecord) -> Result<ConferenceRecord, StoreError>;

    fn find_conference(&self, gid: &str) -> Option<ConferenceRecord>;

    fn find_season(&self, year: &str) -> Option<Season>;

    fn conference_count(&self) -> usize;

    fn season_count(&self) -> usize;

    /// Called once at the end of a run. Writes made by `save` and
    /// `find_or_create_season` are already durable; stores may use this to
    /// compact them.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Tagged log sink injected into an import run.
pub trait ImportLog {
    fn info(&self, tag: &str, message: &str);
    fn warn(&self, tag: &str, message: &str);
    fn error(&self, tag: &str, message: &str);
}
