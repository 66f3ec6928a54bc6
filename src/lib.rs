pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::adapters::{json_store::JsonFileStore, memory_store::MemoryStore};
pub use crate::config::ImportConfig;
pub use crate::core::import_run::{ImportOptions, ImportRun, LOG_TAG};
pub use crate::domain::model::{ImportSummary, RowFailure, RowOutcome, UploadedFile};
pub use crate::domain::ports::{ConferenceStore, ImportLog};
pub use crate::utils::error::{ImportError, Result, RowError, StoreError};
pub use crate::utils::logger::{MemoryLog, TracingLog};
