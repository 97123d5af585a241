//! Errors raised while obtaining the raw sheet payload.
//!
//! Parsing and normalisation never fail; only the source can.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no data source configured: pass --file or set --sheet-id / TASKBOARD_SHEET_ID")]
    NotConfigured,

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("sheet request returned HTTP {status}")]
    Status { status: u16 },

    #[error("sheet is not published to the web (received HTML instead of CSV)")]
    NotPublished,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
