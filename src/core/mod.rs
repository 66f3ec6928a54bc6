pub mod import_run;
pub mod reconciler;
pub mod row_parser;

pub use crate::domain::model::{ConferenceRow, ImportSummary, RowOutcome, UploadedFile};
pub use crate::domain::ports::{ConferenceStore, ImportLog};
pub use crate::utils::error::Result;
