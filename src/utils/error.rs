use serde::{Serialize, Serializer};
use thiserror::Error;

/// Run-level errors. Any of these aborts the import.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid file format: expected CSV, got content type '{content_type}'")]
    InvalidFormat { content_type: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Row-level errors. These are always caught at the row boundary.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("Malformed row: {reason}")]
    Malformed { reason: String },

    #[error("{0}")]
    StorageWrite(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conference with gid '{gid}' already exists")]
    Conflict { gid: String },

    #[error("Validation failed: {field} {message}")]
    Validation { field: String, message: String },

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl ImportError {
    pub fn config(message: impl Into<String>) -> Self {
        ImportError::Config {
            message: message.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ImportError::InvalidFormat { .. } => ErrorSeverity::High,
            ImportError::Config { .. } | ImportError::InvalidConfigValue { .. } => {
                ErrorSeverity::High
            }
            ImportError::Csv(_) => ErrorSeverity::Medium,
            ImportError::Io(_) | ImportError::Store(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ImportError::InvalidFormat { .. } => {
                "Upload a .csv file or pass --content-type text/csv"
            }
            ImportError::Io(_) => "Check that the file exists and is readable",
            ImportError::Csv(_) => "Check that the file is ';'-separated with a header row",
            ImportError::Store(_) => "Check the store path and that the snapshot is valid JSON",
            ImportError::Config { .. } | ImportError::InvalidConfigValue { .. } => {
                "Fix the configuration file or command line arguments"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ImportError::InvalidFormat { .. } => "Oops! Only .csv files can be imported".to_string(),
            other => other.to_string(),
        }
    }
}

impl RowError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        RowError::Malformed {
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, RowError::Malformed { .. })
    }
}

impl StoreError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// Reports carry the message only.
impl Serialize for RowError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_exit_codes() {
        let err = ImportError::InvalidFormat {
            content_type: "image/png".to_string(),
        };
        assert_eq!(err.severity().exit_code(), 1);

        let err = ImportError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.severity().exit_code(), 3);

        // every run-level error fails the process
        for severity in [ErrorSeverity::Medium, ErrorSeverity::High, ErrorSeverity::Critical] {
            assert_ne!(severity.exit_code(), 0);
        }
    }

    #[test]
    fn test_storage_write_displays_store_message() {
        let err: RowError = StoreError::validation("starts_on", "is not a valid date").into();
        assert_eq!(err.to_string(), "Validation failed: starts_on is not a valid date");
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_row_error_serializes_as_message() {
        let err = RowError::malformed("UID is missing");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Malformed row: UID is missing\"");
    }
}
