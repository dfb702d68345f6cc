//! Header-addressed tabular input.
//!
//! Both datasets are read into a [`Table`]: a shared header row plus records
//! whose cells are looked up by column name. A column the file does not have
//! reads as the empty string, which the absent-value convention below treats
//! the same as `NA`.
//!
//! ```text
//! "a; b; NA"  → tokens → ["a", "b"]
//! "NA" / ""   → present → None
//! ```

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::Result;

/// Separator of multi-valued cells.
pub const LIST_SEPARATOR: &str = "; ";

/// Sentinel for a missing value.
pub const ABSENT: &str = "NA";

/// Whether a cell (or token) carries no value.
pub fn is_absent(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell == ABSENT
}

/// The trimmed cell, or `None` if it is absent.
pub fn present(cell: &str) -> Option<&str> {
    if is_absent(cell) { None } else { Some(cell.trim()) }
}

/// Split a multi-valued cell on `"; "`, dropping absent tokens. Order and
/// duplicates are preserved.
pub fn tokens(cell: &str) -> SmallVec<[&str; 4]> {
    cell.split(LIST_SEPARATOR).filter_map(present).collect()
}

/// One data row.
#[derive(Debug, Clone)]
pub struct Record {
    headers: Arc<Vec<String>>,
    cells: Vec<String>,
    line: usize,
}

impl Record {
    /// Cell of `column`, or `""` if the column does not exist.
    pub fn get(&self, column: &str) -> &str {
        self.headers.iter()
            .position(|h| h == column)
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Trimmed cell of `column`, or `None` if absent.
    pub fn present(&self, column: &str) -> Option<&str> {
        present(self.get(column))
    }

    /// Tokens of a multi-valued cell.
    pub fn tokens(&self, column: &str) -> SmallVec<[&str; 4]> {
        tokens(self.get(column))
    }

    /// Line number in the source file (the header is line 1).
    pub fn line(&self) -> usize {
        self.line
    }
}

/// A parsed dataset.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Arc<Vec<String>>,
    rows: Vec<Record>,
}

impl Table {
    /// Build a table in memory. Rows shorter than the header are padded with
    /// empty cells.
    pub fn from_rows<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers: Arc<Vec<String>> = Arc::new(headers.into_iter().map(Into::into).collect());
        let rows = rows.into_iter()
            .enumerate()
            .map(|(i, cells)| Record {
                headers: Arc::clone(&headers),
                cells: cells.into_iter().map(Into::into).collect(),
                line: i + 2,
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse delimited text with a header row.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        Ok(Self::from_rows(headers, rows))
    }

    /// Parse a delimited file with a header row.
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), delimiter)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_convention() {
        assert!(is_absent(""));
        assert!(is_absent("NA"));
        assert!(is_absent("  NA "));
        assert!(!is_absent("na"));
        assert_eq!(present(" mono "), Some("mono"));
    }

    #[test]
    fn test_tokens_split_and_filter() {
        assert_eq!(tokens("initial; NA; final; ").as_slice(), &["initial", "final"]);
        assert_eq!(tokens("a;b").as_slice(), &["a;b"], "only \"; \" separates");
        assert!(tokens("NA").is_empty());
        assert_eq!(tokens("x; x").as_slice(), &["x", "x"]);
    }

    #[test]
    fn test_missing_column_reads_empty() {
        let t = Table::from_rows(["linker"], [["а"]]);
        let row = &t.rows()[0];
        assert_eq!(row.get("linker"), "а");
        assert_eq!(row.get("correl"), "");
        assert_eq!(row.present("correl"), None);
        assert_eq!(row.line(), 2);
    }

    #[test]
    fn test_from_reader_parses_quoted_cells() {
        let text = "linker,comment\nа,\"первый; второй\"\n\"если, то\",NA\n";
        let t = Table::from_reader(text.as_bytes(), b',').unwrap();

        assert_eq!(t.headers(), &["linker".to_string(), "comment".to_string()]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0].tokens("comment").as_slice(), &["первый", "второй"]);
        assert_eq!(t.rows()[1].get("linker"), "если, то");
        assert_eq!(t.rows()[1].line(), 3);
        assert!(t.has_column("comment"));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let text = "linker,semfield1_ed,subfield1_ed\nа,contrast\n";
        let t = Table::from_reader(text.as_bytes(), b',').unwrap();
        assert_eq!(t.rows()[0].get("subfield1_ed"), "");
    }
}
