use crate::core::reconciler::Reconciler;
use crate::core::row_parser::RowParser;
use crate::domain::model::{ImportSummary, RowFailure, RowOutcome, UploadedFile};
use crate::domain::ports::{ConferenceStore, ImportLog};
use crate::utils::error::{ImportError, Result, RowError};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;

/// Tag attached to every line the importer writes to its `ImportLog`.
pub const LOG_TAG: &str = "Importer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub delimiter: u8,
    /// Media types accepted by `run`, compared case-insensitively without parameters.
    pub accepted_content_types: Vec<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            accepted_content_types: vec!["text/csv".to_string()],
        }
    }
}

/// One pass of a conference file into a store.
///
/// Row-level problems end up in the returned `ImportSummary`; only a rejected
/// content type or an I/O failure on the file aborts the run.
pub struct ImportRun<'a, S: ConferenceStore + ?Sized, L: ImportLog + ?Sized> {
    store: &'a mut S,
    log: &'a L,
    options: ImportOptions,
}

impl<'a, S: ConferenceStore + ?Sized, L: ImportLog + ?Sized> ImportRun<'a, S, L> {
    pub fn new(store: &'a mut S, log: &'a L) -> Self {
        Self {
            store,
            log,
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(&mut self, file: &UploadedFile) -> Result<ImportSummary> {
        self.check_valid(file)?;
        let reader = File::open(&file.path)?;
        self.run_reader(&file.original_filename, reader)
    }

    pub fn check_valid(&self, file: &UploadedFile) -> Result<()> {
        let media_type = file.media_type();
        let accepted = self
            .options
            .accepted_content_types
            .iter()
            .any(|accepted| accepted.trim().eq_ignore_ascii_case(&media_type));

        if !accepted {
            return Err(ImportError::InvalidFormat {
                content_type: file.content_type.clone(),
            });
        }
        Ok(())
    }

    /// Imports from any reader. No content type check is done here.
    pub fn run_reader<R: Read>(&mut self, name: &str, reader: R) -> Result<ImportSummary> {
        self.log
            .info(LOG_TAG, &format!("Started importing file {}", name));

        let mut csv = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv.headers().map_err(into_fatal)?.clone();
        let parser = RowParser::new(&headers);

        let missing = parser.missing_columns();
        if !missing.is_empty() {
            self.log.warn(
                LOG_TAG,
                &format!("File {} is missing columns: {}", name, missing.join(", ")),
            );
        }

        let mut summary = ImportSummary::new(name);
        let mut reconciler = Reconciler::new(&mut *self.store);
        let mut record = StringRecord::new();

        loop {
            let outcome: RowOutcome = match csv.read_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {
                    let line = record.position().map(|p| p.line()).unwrap_or_default();
                    parser
                        .parse(line, &record)
                        .and_then(|row| reconciler.upsert(&row))
                        .into()
                }
                Err(e) if e.is_io_error() => return Err(into_fatal(e)),
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or_default();
                    RowOutcome::Failed(RowFailure::new(
                        line,
                        "",
                        RowError::malformed(format!("unreadable record: {}", e)),
                    ))
                }
            };

            if let RowOutcome::Failed(failure) = &outcome {
                self.log.error(
                    LOG_TAG,
                    &format!("Error in {}: {}", failure.uid, failure.error),
                );
            }
            summary.record(outcome);
        }

        summary.seasons_created = reconciler.seasons_created();
        self.store.flush()?;
        summary.finish();
        self.log.info(
            LOG_TAG,
            &format!(
                "Finished updating/creating {} of {} conferences ({} failed)",
                summary.applied,
                summary.total_rows,
                summary.failed()
            ),
        );

        Ok(summary)
    }
}

fn into_fatal(err: csv::Error) -> ImportError {
    if err.is_io_error() {
        ImportError::Io(err.into())
    } else {
        ImportError::Csv(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::utils::logger::{LogLevel, MemoryLog};
    use std::io;

    const HEADER: &str = "UID;Name;Start date;End date;City;Country;Region;Website;Notes\n";

    fn import(store: &mut MemoryStore, log: &MemoryLog, body: &str) -> ImportSummary {
        let content = format!("{}{}", HEADER, body);
        ImportRun::new(store, log)
            .run_reader("conferences.csv", content.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_run_reader_applies_rows() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let summary = import(
            &mut store,
            &log,
            "2017001;Foo;01 06 2017;02 06 2017;Paris;France;Europe;https://foo.example;\n\
             2017002;Bar;10 07 2017;12 07 2017;Lyon;France;Europe;;Bring snacks\n",
        );

        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.seasons_created, 1);
        assert!(summary.failures.is_empty());
        assert!(summary.finished_at.is_some());

        let bar = store.find_conference("2017002").unwrap();
        assert_eq!(bar.fields.notes.as_deref(), Some("Bring snacks"));
        assert_eq!(bar.fields.url, None);
    }

    #[test]
    fn test_logs_start_failure_and_finish() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        import(&mut store, &log, "2017001;Foo;;;;;;;\nABCD001;Bad;;;;;;;\n");

        let lines = log.lines();
        assert_eq!(lines.first().unwrap().message, "Started importing file conferences.csv");
        assert_eq!(
            lines.last().unwrap().message,
            "Finished updating/creating 1 of 2 conferences (1 failed)"
        );
        let errors = log.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Error in ABCD001: "));
        assert!(lines.iter().all(|l| l.tag == LOG_TAG));
    }

    #[test]
    fn test_failure_lines_are_file_lines() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let summary = import(&mut store, &log, "2017001;Foo;;;;;;;\n;Nameless;;;;;;;\n");

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].line, 3);
        assert_eq!(summary.failures[0].uid, "");
    }

    #[test]
    fn test_missing_uid_column_warns_and_fails_rows() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let summary = ImportRun::new(&mut store, &log)
            .run_reader("no-uid.csv", "Name;City\nFoo;Paris\nBar;Lyon\n".as_bytes())
            .unwrap();

        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.failed(), 2);
        assert_eq!(store.conference_count(), 0);
        assert!(log
            .lines()
            .iter()
            .any(|l| l.level == LogLevel::Warn && l.message.contains("UID")));
    }

    #[test]
    fn test_invalid_utf8_row_is_isolated() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let mut content = HEADER.as_bytes().to_vec();
        content.extend_from_slice(b"2017001;Caf\xe9;;;;;;;\n");
        content.extend_from_slice(b"2017002;Fine;;;;;;;\n");

        let summary = ImportRun::new(&mut store, &log)
            .run_reader("latin1.csv", content.as_slice())
            .unwrap();

        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.applied, 1);
        assert!(summary.failures[0].error.is_malformed());
        assert!(store.find_conference("2017002").is_some());
    }

    #[test]
    fn test_custom_delimiter() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let options = ImportOptions {
            delimiter: b',',
            ..Default::default()
        };
        let summary = ImportRun::new(&mut store, &log)
            .with_options(options)
            .run_reader("comma.csv", "UID,Name\n2020001,Foo\n".as_bytes())
            .unwrap();

        assert_eq!(summary.applied, 1);
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "disk went away"));
            }
            self.served = true;
            let chunk = b"UID;Name\n2017001;Foo\n";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_io_error_mid_stream_aborts_but_keeps_applied_rows() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let result = ImportRun::new(&mut store, &log)
            .run_reader("broken.csv", FailingReader { served: false });

        assert!(matches!(result, Err(ImportError::Io(_))));
        assert_eq!(store.conference_count(), 1);
    }

    #[test]
    fn test_season_of_failed_row_is_counted() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let summary = import(&mut store, &log, "2017001;Bad;2017-06-01;;;;;;\n");

        assert_eq!(summary.applied, 0);
        assert_eq!(summary.failed(), 1);
        assert_eq!(store.season_count(), 1);
        assert_eq!(summary.seasons_created, 1);
    }

    #[test]
    fn test_rejected_content_type_is_left_to_the_caller_to_log() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let result = ImportRun::new(&mut store, &log)
            .run(&UploadedFile::new("a.png", "image/png", "a.png"));

        assert!(matches!(result, Err(ImportError::InvalidFormat { .. })));
        assert!(log.lines().is_empty());
    }

    #[test]
    fn test_check_valid_content_types() {
        let mut store = MemoryStore::new();
        let log = MemoryLog::new();
        let run = ImportRun::new(&mut store, &log);

        assert!(run
            .check_valid(&UploadedFile::new("a.csv", "text/csv; charset=utf-8", "a.csv"))
            .is_ok());
        assert!(matches!(
            run.check_valid(&UploadedFile::new("a.png", "image/png", "a.png")),
            Err(ImportError::InvalidFormat { .. })
        ));
    }
}
