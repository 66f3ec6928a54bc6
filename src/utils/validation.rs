use crate::utils::error::{ImportError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ImportError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ImportError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ImportError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// The CSV reader takes a single byte as separator.
pub fn validate_delimiter(field_name: &str, value: char) -> Result<u8> {
    if !value.is_ascii() || value == '"' || value == '\n' || value == '\r' {
        return Err(ImportError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        });
    }
    Ok(value as u8)
}

/// Content types must look like `type/subtype`.
pub fn validate_content_types(field_name: &str, content_types: &[String]) -> Result<()> {
    if content_types.is_empty() {
        return Err(ImportError::InvalidConfigValue {
            field: field_name.to_string(),
            value: String::new(),
            reason: "At least one content type must be accepted".to_string(),
        });
    }

    for content_type in content_types {
        validate_non_empty_string(field_name, content_type)?;
        let mut parts = content_type.split('/');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(kind), Some(sub), None) if !kind.trim().is_empty() && !sub.trim().is_empty()
        );
        if !valid {
            return Err(ImportError::InvalidConfigValue {
                field: field_name.to_string(),
                value: content_type.clone(),
                reason: "Expected a media type such as text/csv".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("store.path", "conferences.json").is_ok());
        assert!(validate_path("store.path", "").is_err());
        assert!(validate_path("store.path", "a\0b").is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("import.delimiter", ';').unwrap(), b';');
        assert_eq!(validate_delimiter("import.delimiter", '\t').unwrap(), b'\t');
        assert!(validate_delimiter("import.delimiter", '"').is_err());
        assert!(validate_delimiter("import.delimiter", '§').is_err());
    }

    #[test]
    fn test_validate_content_types() {
        let ok = vec!["text/csv".to_string(), "application/vnd.ms-excel".to_string()];
        assert!(validate_content_types("import.accepted_content_types", &ok).is_ok());

        assert!(validate_content_types("import.accepted_content_types", &[]).is_err());

        let bad = vec!["csv".to_string()];
        assert!(validate_content_types("import.accepted_content_types", &bad).is_err());
    }
}
