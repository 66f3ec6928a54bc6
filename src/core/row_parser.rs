use crate::domain::model::{ConferenceFields, ConferenceRow, ConferenceUid, RowFailure, HEADERS};
use crate::utils::error::RowError;
use csv::StringRecord;

/// Maps the header row to column positions and turns data records into `ConferenceRow`s.
#[derive(Debug, Clone)]
pub struct RowParser {
    columns: [Option<usize>; 9],
}

const UID: usize = 0;
const NAME: usize = 1;
const START_DATE: usize = 2;
const END_DATE: usize = 3;
const CITY: usize = 4;
const COUNTRY: usize = 5;
const REGION: usize = 6;
const WEBSITE: usize = 7;
const NOTES: usize = 8;

impl RowParser {
    pub fn new(headers: &StringRecord) -> Self {
        let mut columns = [None; 9];
        for (slot, name) in columns.iter_mut().zip(HEADERS) {
            *slot = headers.iter().position(|h| h.trim() == name);
        }
        Self { columns }
    }

    /// Expected header names that are not present in the file.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .zip(HEADERS)
            .filter(|(slot, _)| slot.is_none())
            .map(|(_, name)| name)
            .collect()
    }

    pub fn parse(&self, line: u64, record: &StringRecord) -> Result<ConferenceRow, RowFailure> {
        let raw_uid = self.raw(UID, record).unwrap_or_default();

        if self.columns[UID].is_none() {
            return Err(RowFailure::new(
                line,
                raw_uid,
                RowError::malformed("UID column is missing"),
            ));
        }

        let uid =
            ConferenceUid::parse(raw_uid).map_err(|e| RowFailure::new(line, raw_uid, e))?;

        let fields = ConferenceFields {
            name: self.field(NAME, record),
            starts_on: self.field(START_DATE, record),
            ends_on: self.field(END_DATE, record),
            city: self.field(CITY, record),
            country: self.field(COUNTRY, record),
            region: self.field(REGION, record),
            url: self.field(WEBSITE, record),
            notes: self.field(NOTES, record),
        };

        Ok(ConferenceRow { line, uid, fields })
    }

    fn raw<'r>(&self, column: usize, record: &'r StringRecord) -> Option<&'r str> {
        self.columns[column].and_then(|idx| record.get(idx))
    }

    fn field(&self, column: usize, record: &StringRecord) -> Option<String> {
        self.raw(column, record)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> StringRecord {
        StringRecord::from(HEADERS.to_vec())
    }

    #[test]
    fn test_parse_full_row() {
        let parser = RowParser::new(&headers());
        let record = StringRecord::from(vec![
            "2017001",
            "RustConf",
            "16 08 2017",
            "18 08 2017",
            "Portland",
            "USA",
            "North America",
            "https://rustconf.com",
            "",
        ]);

        let row = parser.parse(2, &record).unwrap();

        assert_eq!(row.line, 2);
        assert_eq!(row.uid.as_str(), "2017001");
        assert_eq!(row.fields.name.as_deref(), Some("RustConf"));
        assert_eq!(row.fields.starts_on.as_deref(), Some("16 08 2017"));
        assert_eq!(row.fields.url.as_deref(), Some("https://rustconf.com"));
        assert_eq!(row.fields.notes, None);
    }

    #[test]
    fn test_columns_found_by_name() {
        let headers = StringRecord::from(vec!["Name", "UID", "City"]);
        let parser = RowParser::new(&headers);
        let row = parser
            .parse(2, &StringRecord::from(vec!["Foo", "2018004", "Berlin"]))
            .unwrap();

        assert_eq!(row.uid.as_str(), "2018004");
        assert_eq!(row.fields.name.as_deref(), Some("Foo"));
        assert_eq!(row.fields.city.as_deref(), Some("Berlin"));
        assert_eq!(row.fields.country, None);
        assert_eq!(parser.missing_columns().len(), 6);
    }

    #[test]
    fn test_empty_uid_fails_with_raw_identifier() {
        let parser = RowParser::new(&headers());
        let failure = parser
            .parse(5, &StringRecord::from(vec!["", "Nameless"]))
            .unwrap_err();

        assert_eq!(failure.line, 5);
        assert_eq!(failure.uid, "");
        assert!(failure.error.is_malformed());
    }

    #[test]
    fn test_missing_uid_column_fails_every_row() {
        let parser = RowParser::new(&StringRecord::from(vec!["Name", "City"]));
        assert_eq!(parser.missing_columns()[0], "UID");

        let failure = parser
            .parse(2, &StringRecord::from(vec!["Foo", "Paris"]))
            .unwrap_err();
        assert!(failure.error.to_string().contains("UID column is missing"));
    }

    #[test]
    fn test_short_record_leaves_fields_empty() {
        let parser = RowParser::new(&headers());
        let row = parser
            .parse(3, &StringRecord::from(vec!["2019002", "Short"]))
            .unwrap();

        assert_eq!(row.fields.name.as_deref(), Some("Short"));
        assert_eq!(row.fields.starts_on, None);
        assert_eq!(row.fields.notes, None);
    }
}
