use crate::utils::error::{RowError, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Column names of the import file, in their canonical order.
pub const HEADERS: [&str; 9] = [
    "UID",
    "Name",
    "Start date",
    "End date",
    "City",
    "Country",
    "Region",
    "Website",
    "Notes",
];

/// Date format used by the `Start date` / `End date` columns.
pub const DATE_FORMAT: &str = "%d %m %Y";

/// External conference identifier, e.g. `2017001` (season + sequence).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConferenceUid(String);

impl ConferenceUid {
    /// Trims surrounding whitespace; an empty result is rejected.
    pub fn parse(raw: &str) -> Result<Self, RowError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RowError::malformed("UID is empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The season is the first 4 characters, which must be ASCII digits.
    pub fn season_key(&self) -> Result<SeasonKey, RowError> {
        let prefix: String = self.0.chars().take(4).collect();
        if prefix.chars().count() < 4 {
            return Err(RowError::malformed(format!(
                "UID '{}' is too short to carry a 4-digit season",
                self.0
            )));
        }

        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RowError::malformed(format!(
                "UID '{}' does not start with a 4-digit season",
                self.0
            )));
        }

        Ok(SeasonKey(prefix))
    }
}

impl fmt::Display for ConferenceUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Year string a season is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeasonKey(String);

impl SeasonKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: u64,
    pub name: String,
}

/// Result of `find_or_create_season`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRef {
    pub id: u64,
    pub created: bool,
}

/// Scalar columns copied from one CSV row. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceFields {
    pub name: Option<String>,
    pub starts_on: Option<String>,
    pub ends_on: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceRecord {
    /// Assigned by the store on first save.
    pub id: Option<u64>,
    pub gid: String,
    pub season_id: Option<u64>,
    #[serde(flatten)]
    pub fields: ConferenceFields,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConferenceRecord {
    pub fn new(gid: &str) -> Self {
        Self {
            id: None,
            gid: gid.to_string(),
            season_id: None,
            fields: ConferenceFields::default(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Replaces every scalar field and binds the season.
    pub fn assign(&mut self, fields: ConferenceFields, season_id: u64) {
        self.fields = fields;
        self.season_id = Some(season_id);
    }

    /// Checks a record before it is written. Stores call this from `save`.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.gid.trim().is_empty() {
            return Err(StoreError::validation("gid", "can't be blank"));
        }
        if self.season_id.is_none() {
            return Err(StoreError::validation("season", "must exist"));
        }

        let starts_on = parse_date("starts_on", self.fields.starts_on.as_deref())?;
        let ends_on = parse_date("ends_on", self.fields.ends_on.as_deref())?;

        if let (Some(starts_on), Some(ends_on)) = (starts_on, ends_on) {
            if ends_on < starts_on {
                return Err(StoreError::validation(
                    "ends_on",
                    format!("({}) is before starts_on ({})", ends_on, starts_on),
                ));
            }
        }

        Ok(())
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, StoreError> {
    match value {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|e| {
                StoreError::validation(field, format!("'{}' is not a dd mm yyyy date ({})", raw, e))
            }),
    }
}

/// One normalized data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceRow {
    pub line: u64,
    pub uid: ConferenceUid,
    pub fields: ConferenceFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Applied {
    pub line: u64,
    pub uid: String,
    pub action: UpsertAction,
}

/// A row that could not be applied. `uid` is the raw identifier, possibly empty.
#[derive(Debug, Serialize)]
pub struct RowFailure {
    pub line: u64,
    pub uid: String,
    pub error: RowError,
}

impl RowFailure {
    pub fn new(line: u64, uid: impl Into<String>, error: RowError) -> Self {
        Self {
            line,
            uid: uid.into(),
            error,
        }
    }
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} (UID '{}'): {}", self.line, self.uid, self.error)
    }
}

#[derive(Debug)]
pub enum RowOutcome {
    Applied(Applied),
    Failed(RowFailure),
}

impl From<Result<Applied, RowFailure>> for RowOutcome {
    fn from(result: Result<Applied, RowFailure>) -> Self {
        match result {
            Ok(applied) => RowOutcome::Applied(applied),
            Err(failure) => RowOutcome::Failed(failure),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub file_name: String,
    pub total_rows: usize,
    pub applied: usize,
    pub created: usize,
    pub updated: usize,
    /// Seasons the run created, including those of rows that failed later.
    pub seasons_created: usize,
    pub failures: Vec<RowFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportSummary {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            total_rows: 0,
            applied: 0,
            created: 0,
            updated: 0,
            seasons_created: 0,
            failures: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        self.total_rows += 1;
        match outcome {
            RowOutcome::Applied(applied) => {
                self.applied += 1;
                match applied.action {
                    UpsertAction::Created => self.created += 1,
                    UpsertAction::Updated => self.updated += 1,
                }
            }
            RowOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// An uploaded file as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_filename: String,
    pub content_type: String,
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn new(
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            path: path.into(),
        }
    }

    /// Builds an upload from a local path, guessing the content type from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let content_type = if is_csv {
            "text/csv"
        } else {
            "application/octet-stream"
        };

        Self {
            original_filename,
            content_type: content_type.to_string(),
            path,
        }
    }

    /// Media type without parameters, lowercased (`Text/CSV; charset=utf-8` -> `text/csv`).
    pub fn media_type(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}
