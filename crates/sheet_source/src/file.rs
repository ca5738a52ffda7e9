use std::fs::File;
use std::path::{Path, PathBuf};

use models::{ColumnNames, LedgerRow};

use crate::{csv_table::parse_ledger_csv, FetchError, LedgerSource};

/// Reads the ledger from a CSV file on disk, e.g. a manual export.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
    columns: ColumnNames,
}

impl CsvFileSource {
    pub fn new<P: AsRef<Path>>(path: P, columns: ColumnNames) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            columns,
        }
    }
}

impl LedgerSource for CsvFileSource {
    fn name(&self) -> &str {
        "csv-file"
    }

    fn fetch(&self) -> Result<Vec<LedgerRow>, FetchError> {
        tracing::info!(path = %self.path.display(), "reading ledger csv");
        let file = File::open(&self.path)?;
        parse_ledger_csv(file, &self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows_from_disk() {
        let path = std::env::temp_dir().join(format!("ledger_file_source_{}.csv", std::process::id()));
        std::fs::write(&path, "member,category,subcategory,amount\nA,cash,bank,\"1,000\"\n").unwrap();

        let rows = CsvFileSource::new(&path, ColumnNames::default()).fetch().unwrap();
        assert_eq!(rows, vec![LedgerRow::new("A", "cash", "bank", "1,000")]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let src = CsvFileSource::new("/definitely/not/here.csv", ColumnNames::default());
        assert!(matches!(src.fetch(), Err(FetchError::Io(_))));
    }
}
