//! Raw Table Module
//! Untyped header + rows grid exactly as exported by the spreadsheet.

use crate::data::loader::LoadFailure;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Rows of untyped cells under a header row.
///
/// Empty fields are `None`. Header names may repeat and rows may be blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Build a table from headers and rows; ragged rows are padded or truncated.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse CSV text whose first record is the header row.
    ///
    /// Header names are kept verbatim; data cells are trimmed.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, LoadFailure> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Fields)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(LoadFailure::MissingHeader);
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let row = (0..width)
                .map(|i| {
                    record
                        .get(i)
                        .filter(|cell| !cell.is_empty())
                        .map(str::to_string)
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Parse a local CSV file.
    pub fn from_path(path: &Path) -> Result<Self, LoadFailure> {
        let file = File::open(path).map_err(|source| LoadFailure::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn keeps_duplicate_headers_and_blank_rows() -> Result<()> {
        let csv = "District,Total,Total\nKampala,1,2\n,,\nGulu,3,\n";
        let table = RawTable::from_csv_reader(csv.as_bytes())?;

        assert_eq!(table.headers(), &["District", "Total", "Total"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[1], vec![None, None, None]);
        assert_eq!(
            table.rows()[2],
            vec![Some("Gulu".to_string()), Some("3".to_string()), None]
        );
        Ok(())
    }

    #[test]
    fn ragged_rows_are_squared_off() -> Result<()> {
        let csv = "A,B,C\n1\n1,2,3,4\n";
        let table = RawTable::from_csv_reader(csv.as_bytes())?;

        assert_eq!(table.rows()[0], vec![Some("1".to_string()), None, None]);
        assert_eq!(table.rows()[1].len(), 3);
        Ok(())
    }

    #[test]
    fn cells_are_trimmed_but_headers_kept_verbatim() -> Result<()> {
        let csv = "District , Div1_M\n  Kampala  , 10 \n";
        let table = RawTable::from_csv_reader(csv.as_bytes())?;

        assert_eq!(table.headers(), &["District ", " Div1_M"]);
        assert_eq!(
            table.rows()[0],
            vec![Some("Kampala".to_string()), Some("10".to_string())]
        );
        Ok(())
    }

    #[test]
    fn empty_input_has_no_header() {
        let result = RawTable::from_csv_reader("".as_bytes());
        assert!(matches!(result, Err(LoadFailure::MissingHeader)));
    }

    #[test]
    fn invalid_utf8_is_malformed_csv() {
        let result = RawTable::from_csv_reader(&b"A,B\n\xff,1\n"[..]);
        assert!(matches!(result, Err(LoadFailure::Csv(_))));
    }

    #[test]
    fn loads_from_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "District,Div1_M")?;
        writeln!(tmp, "Gulu,4")?;

        let table = RawTable::from_path(tmp.path())?;
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column_count(), 2);
        Ok(())
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let result = RawTable::from_path(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(LoadFailure::Io { .. })));
    }
}
