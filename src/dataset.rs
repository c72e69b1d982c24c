//! CSV table loading.
//!
//! Cells stay as raw text here; numeric interpretation happens at the
//! aggregation layer, typed row access goes through serde.

use anyhow::{Context, Result};
use csv::StringRecord;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// A delimited table with a header row.
#[derive(Debug, Default, Clone)]
pub struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    #[cfg(test)]
    pub(crate) fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Table {
            headers: StringRecord::from(headers.to_vec()),
            rows: rows.iter().map(|r| StringRecord::from(r.to_vec())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of data rows (the header does not count).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Deserialize every row into a typed record, mapping fields by header
    /// name. A cell that does not fit the record type is a hard error.
    pub fn deserialize_rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|row| {
                row.deserialize(Some(&self.headers))
                    .context("malformed measurement row")
            })
            .collect()
    }
}

pub(crate) fn parse_f64(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
}

/// Load a CSV file into a [`Table`]. A missing file is not an error: the
/// caller gets an empty table and downstream stages skip that source. Any
/// other I/O or parse failure aborts the run.
pub fn load_table(path: &Path) -> Result<Table> {
    let file = match File::open(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("could not find file {}", path.display());
            return Ok(Table::default());
        }
        other => other.with_context(|| format!("open {}", path.display()))?,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = rdr
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .clone();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record.with_context(|| format!("parse {}", path.display()))?);
    }
    debug!("loaded {} rows from {}", rows.len(), path.display());
    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("measurement-report-{name}"));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let table = load_table(Path::new("definitely/not/here.csv")).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().count(), 0);
    }

    #[test]
    fn loads_rows_and_headers_in_order() {
        let path = temp_csv(
            "load.csv",
            "num_provers,sync_time_ms\n0,5000\n0,7000\n1,3000\n",
        );
        let table = load_table(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.columns().collect::<Vec<_>>(),
            vec!["num_provers", "sync_time_ms"]
        );
        let idx = table.column_index("sync_time_ms").unwrap();
        assert_eq!(table.rows()[0].get(idx), Some("5000"));
        assert_eq!(table.rows()[2].get(idx), Some("3000"));
        assert!(table.column_index("missing").is_none());
    }

    #[test]
    fn parse_f64_rejects_blank_and_junk_cells() {
        assert_eq!(parse_f64(Some("1.5")), Some(1.5));
        assert_eq!(parse_f64(Some(" 2 ")), Some(2.0));
        assert_eq!(parse_f64(Some("")), None);
        assert_eq!(parse_f64(Some("oops")), None);
        assert_eq!(parse_f64(None), None);
    }
}
