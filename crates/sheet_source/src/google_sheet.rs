use std::time::Duration;

use models::{ColumnNames, LedgerRow};
use reqwest::blocking::Client;

use crate::{csv_table::parse_ledger_csv, FetchError, LedgerSource};

const EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// CSV export URL for one sheet (tab) of a spreadsheet.
pub fn export_url(sheet_id: &str, gid: &str) -> String {
    format!(
        "{EXPORT_BASE}/{}/export?format=csv&gid={}",
        sheet_id.trim(),
        gid.trim()
    )
}

/// Reads the ledger from a spreadsheet's public CSV export.
#[derive(Debug, Clone)]
pub struct GoogleSheetSource {
    http: Client,
    url: String,
    columns: ColumnNames,
}

impl GoogleSheetSource {
    pub fn new(sheet_id: &str, gid: &str, columns: ColumnNames) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(Duration::from_secs(20)).build()?;
        Ok(Self {
            http,
            url: export_url(sheet_id, gid),
            columns,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A sheet that is not shared publicly answers with a sign-in page instead of CSV.
fn reject_html(body: &str) -> Result<(), FetchError> {
    let head: String = body.trim_start().chars().take(15).collect::<String>().to_ascii_lowercase();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        return Err(FetchError::Malformed(
            "received an HTML page instead of CSV; check that the sheet is shared".to_string(),
        ));
    }
    Ok(())
}

impl LedgerSource for GoogleSheetSource {
    fn name(&self) -> &str {
        "google-sheet"
    }

    fn fetch(&self) -> Result<Vec<LedgerRow>, FetchError> {
        tracing::info!(url = %self.url, "fetching ledger export");
        let body = self.http.get(&self.url).send()?.error_for_status()?.text()?;
        reject_html(&body)?;
        parse_ledger_csv(body.as_bytes(), &self.columns)
    }
}
