//! Checkpoint ledger: the durable record of fetch attempts
//!
//! The ledger is a flat CSV file (UTF-8 with BOM) with one self-contained row
//! per attempt. At startup it is replayed to reconstruct the set of URLs that
//! already succeeded, which is what makes a killed crawl resumable without
//! refetching or re-emitting output.

mod file;
mod record;

pub use file::FileLedger;
pub use record::{LedgerRecord, OutcomeStatus};

use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed ledger row {line}: {message}")]
    MalformedRow { line: usize, message: String },
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
