pub mod cache;
pub mod csv_table;
pub mod file;
pub mod google_sheet;

use models::LedgerRow;
use thiserror::Error;

pub use cache::CachedLedgerSource;
pub use csv_table::parse_ledger_csv;
pub use file::CsvFileSource;
pub use google_sheet::{export_url, GoogleSheetSource};

/// A required column could not be located in the CSV header.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("ledger is missing required column '{column}' (header: {header:?})")]
pub struct MissingColumnError {
    pub column: String,
    pub header: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    MissingColumn(#[from] MissingColumnError),
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

/// Upstream collaborator supplying raw ledger rows.
pub trait LedgerSource {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<Vec<LedgerRow>, FetchError>;
}

impl<S: LedgerSource + ?Sized> LedgerSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self) -> Result<Vec<LedgerRow>, FetchError> {
        (**self).fetch()
    }
}
