pub mod toml_config;

pub use toml_config::ImportConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::ImportConfig;
    use crate::domain::model::UploadedFile;
    use crate::utils::error::Result;
    use crate::utils::logger::LogFormat;
    use crate::utils::validation::Validate;
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "conference-import")]
    #[command(about = "Create or update conferences from a ';'-separated CSV file")]
    pub struct CliConfig {
        /// CSV file to import
        pub file: PathBuf,

        /// Declared content type of the file (guessed from the extension when omitted)
        #[arg(long)]
        pub content_type: Option<String>,

        /// Path to TOML configuration file
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        /// JSON store file, overrides store.path
        #[arg(long)]
        pub store: Option<String>,

        /// Column separator, overrides import.delimiter
        #[arg(long)]
        pub delimiter: Option<char>,

        /// Run against a copy of the store and discard the changes
        #[arg(long)]
        pub dry_run: bool,

        /// Write the import summary as JSON to this path
        #[arg(long)]
        pub summary_json: Option<PathBuf>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        /// compact or json, overrides logging.format
        #[arg(long)]
        pub log_format: Option<LogFormat>,
    }

    impl CliConfig {
        /// Loads the config file (if any) and applies command line overrides.
        pub fn resolve(&self) -> Result<ImportConfig> {
            let mut config = match &self.config {
                Some(path) => ImportConfig::from_file(path)?,
                None => ImportConfig::default(),
            };

            if let Some(store) = &self.store {
                config.store.path = store.clone();
            }
            if let Some(delimiter) = self.delimiter {
                config.import.delimiter = delimiter;
            }
            if let Some(format) = self.log_format {
                config.logging.format = format;
            }
            config.logging.verbose |= self.verbose;

            config.validate()?;
            Ok(config)
        }

        pub fn uploaded_file(&self) -> UploadedFile {
            let mut file = UploadedFile::from_path(&self.file);
            if let Some(content_type) = &self.content_type {
                file.content_type = content_type.clone();
            }
            file
        }
    }

}

#[cfg(feature = "cli")]
pub use cli::CliConfig;
