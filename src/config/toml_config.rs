use crate::core::import_run::ImportOptions;
use crate::utils::error::{ImportError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub import: ImportSection,
    pub store: StoreSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    pub delimiter: char,
    pub accepted_content_types: Vec<String>,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            delimiter: ';',
            accepted_content_types: vec!["text/csv".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: "conferences.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub format: LogFormat,
    pub verbose: bool,
}

impl ImportConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ImportError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| ImportError::config(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ImportError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_delimiter("import.delimiter", self.import.delimiter)?;
        validation::validate_content_types(
            "import.accepted_content_types",
            &self.import.accepted_content_types,
        )?;
        validation::validate_path("store.path", &self.store.path)?;
        Ok(())
    }

    pub fn import_options(&self) -> Result<ImportOptions> {
        Ok(ImportOptions {
            delimiter: validation::validate_delimiter("import.delimiter", self.import.delimiter)?,
            accepted_content_types: self.import.accepted_content_types.clone(),
        })
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
