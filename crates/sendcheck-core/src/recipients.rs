//! Recipient table loading
//!
//! Recipients come from a CSV file whose header row names at least the
//! `email` and `first_name` columns. The batch is validated as a whole: any
//! missing column, unreadable row or blank field rejects every recipient so
//! that nothing is sent from a half-valid table.

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Recipient;

/// Required column holding the destination address
pub const EMAIL_COLUMN: &str = "email";

/// Required column holding the given name
pub const FIRST_NAME_COLUMN: &str = "first_name";

/// Load and validate recipients from a CSV file on disk
pub fn load_recipients_from_path(path: impl AsRef<Path>) -> Result<Vec<Recipient>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        Error::input_validation(format!(
            "cannot read recipient file '{}': {}",
            path.display(),
            e
        ))
    })?;
    load_recipients(file)
}

/// Load and validate recipients from any CSV source
pub fn load_recipients<R: Read>(reader: R) -> Result<Vec<Recipient>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::input_validation(format!("cannot read CSV header: {}", e)))?
        .clone();

    let email_idx = column_index(&headers, EMAIL_COLUMN)?;
    let name_idx = column_index(&headers, FIRST_NAME_COLUMN)?;

    let mut recipients = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        // header is line 1
        let line = row + 2;
        let record = record
            .map_err(|e| Error::input_validation(format!("line {}: unreadable row: {}", line, e)))?;

        let email = required_field(&record, email_idx, EMAIL_COLUMN, line)?;
        let first_name = required_field(&record, name_idx, FIRST_NAME_COLUMN, line)?;
        recipients.push(Recipient::new(email, first_name));
    }

    if recipients.is_empty() {
        return Err(Error::input_validation("recipient table has no rows"));
    }

    tracing::debug!(count = recipients.len(), "Loaded recipient table");
    Ok(recipients)
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or_else(|| {
            Error::input_validation(format!(
                "CSV must contain '{}' and '{}' columns (missing '{}')",
                EMAIL_COLUMN, FIRST_NAME_COLUMN, column
            ))
        })
}

fn required_field(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    line: usize,
) -> Result<String> {
    match record.get(idx) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(Error::input_validation(format!(
            "line {}: missing value for '{}'",
            line, column
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_rows_in_order() {
        let csv = "email,first_name\na@x.com,Ann\nb@x.com,Bo\n";
        let recipients = load_recipients(csv.as_bytes()).unwrap();
        assert_eq!(
            recipients,
            vec![Recipient::new("a@x.com", "Ann"), Recipient::new("b@x.com", "Bo")]
        );
    }

    #[test]
    fn test_extra_columns_and_header_case() {
        let csv = "id, First_Name ,EMAIL,city\n1,Ann,a@x.com,Pune\n";
        let recipients = load_recipients(csv.as_bytes()).unwrap();
        assert_eq!(recipients, vec![Recipient::new("a@x.com", "Ann")]);
    }

    #[test]
    fn test_missing_column_rejects_batch() {
        let csv = "email,name\na@x.com,Ann\n";
        let err = load_recipients(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
        assert!(err.to_string().contains("first_name"));
    }

    #[test]
    fn test_blank_field_rejects_batch() {
        let csv = "email,first_name\na@x.com,Ann\nb@x.com,  \n";
        let err = load_recipients(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_ragged_row_rejects_batch() {
        let csv = "email,first_name\na@x.com\n";
        assert!(load_recipients(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = load_recipients("email,first_name\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no rows"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipients.csv");
        std::fs::write(&path, "email,first_name\nc@x.com,Cy\n").unwrap();

        let recipients = load_recipients_from_path(&path).unwrap();
        assert_eq!(recipients[0].first_name, "Cy");

        let missing = load_recipients_from_path(dir.path().join("nope.csv"));
        assert!(matches!(missing, Err(Error::InputValidation(_))));
    }
}
