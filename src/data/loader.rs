//! Sheet Loader Module
//! Fetches the CSV export of a published spreadsheet tab over HTTP.

use crate::config::DashboardConfig;
use crate::data::RawTable;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoadFailure {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV export has no header row")]
    MissingHeader,
}

/// Identifies one fetch: spreadsheet id plus tab name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    pub sheet_id: String,
    pub sheet_name: String,
}

impl SheetKey {
    pub fn new(sheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

/// Anything that can produce a raw table for a sheet key.
pub trait SheetSource {
    fn fetch(&self, key: &SheetKey) -> Result<RawTable, LoadFailure>;
}

/// Loads sheets through the spreadsheet's CSV export endpoint.
pub struct SheetLoader {
    client: Client,
    export_base_url: String,
}

impl SheetLoader {
    pub fn new(config: &DashboardConfig) -> Result<Self, LoadFailure> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            export_base_url: config.export_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Export endpoint for a sheet; the tab and format go in the query string.
    pub fn export_url(&self, key: &SheetKey) -> String {
        format!("{}/{}/gviz/tq", self.export_base_url, key.sheet_id)
    }
}

impl SheetSource for SheetLoader {
    fn fetch(&self, key: &SheetKey) -> Result<RawTable, LoadFailure> {
        let url = self.export_url(key);
        info!(sheet_id = %key.sheet_id, sheet = %key.sheet_name, "fetching sheet export");

        let response = self
            .client
            .get(&url)
            .query(&[("tqx", "out:csv"), ("sheet", key.sheet_name.as_str())])
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LoadFailure::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text()?;
        debug!(bytes = body.len(), "export body received");

        let table = RawTable::from_csv_reader(body.as_bytes())?;
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "sheet export loaded"
        );
        Ok(table)
    }
}

/// Reads a local CSV file regardless of the requested key.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SheetSource for CsvFileSource {
    fn fetch(&self, _key: &SheetKey) -> Result<RawTable, LoadFailure> {
        info!(path = %self.path.display(), "loading local CSV");
        RawTable::from_path(&self.path)
    }
}
