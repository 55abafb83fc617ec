//! Flat-file ledger backend
//!
//! One CSV file, UTF-8 with BOM, fixed header, one row appended per attempt.
//! Appends are single `write_all` calls of one self-contained row, so a kill
//! mid-run can at worst lose the row being written, never corrupt prior rows.

use crate::ledger::record::{LedgerRecord, HEADER};
use crate::ledger::{LedgerResult, OutcomeStatus};
use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

const BOM: &str = "\u{feff}";

/// Durable, append-only ledger stored in a single CSV file
///
/// The ledger exclusively owns its file; shared use goes through one
/// mutex-guarded instance so appends never interleave.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Opens a ledger at the given path; the file is created on first append
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The ledger file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records in file order
    ///
    /// A missing file is an empty ledger. Malformed rows abort the load; a
    /// partial final row (killed mid-write) is tolerated and skipped.
    pub fn load(&self) -> LedgerResult<Vec<LedgerRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let content = content.strip_prefix(BOM).unwrap_or(&content);

        let mut records = Vec::new();
        let mut lines = content.lines().enumerate().peekable();

        // Skip the header row
        if let Some((_, first)) = lines.peek() {
            if *first == HEADER {
                lines.next();
            }
        }

        while let Some((index, line)) = lines.next() {
            if line.trim().is_empty() {
                continue;
            }
            match LedgerRecord::from_row(line, index + 1) {
                Ok(record) => records.push(record),
                // A torn final row is the expected shape of a mid-write kill
                Err(e) if lines.peek().is_none() => {
                    tracing::warn!("Skipping torn final ledger row: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    /// Reconstructs the set of URLs with at least one `success` record
    ///
    /// This set is the sole gate for idempotent refetching: a URL stays
    /// visited even if a later `failed` row exists, because its bytes are
    /// already archived.
    pub fn visited_urls(&self) -> LedgerResult<HashSet<String>> {
        let records = self.load()?;
        Ok(records
            .into_iter()
            .filter(|r| r.status == OutcomeStatus::Success)
            .map(|r| r.url)
            .collect())
    }

    /// Returns the latest `success` record per URL
    pub fn latest_success_records(&self) -> LedgerResult<HashMap<String, LedgerRecord>> {
        let records = self.load()?;
        let mut latest = HashMap::new();
        for record in records {
            if record.status == OutcomeStatus::Success {
                latest.insert(record.url.clone(), record);
            }
        }
        Ok(latest)
    }

    /// The URL of the final row in file order, regardless of status
    ///
    /// Chain crawls resume from here.
    pub fn last_entry_url(&self) -> LedgerResult<Option<String>> {
        Ok(self.load()?.pop().map(|r| r.url))
    }

    /// Appends one record atomically with respect to row boundaries
    ///
    /// The file is opened in append mode and the row is written with a single
    /// call; the BOM and header are written first when the file is new.
    pub fn append(&self, record: &LedgerRecord) -> LedgerResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let is_new = file.metadata()?.len() == 0;

        let mut buf = String::new();
        if is_new {
            buf.push_str(BOM);
            buf.push_str(HEADER);
            buf.push('\n');
        }
        buf.push_str(&record.to_row());
        buf.push('\n');

        file.write_all(buf.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Rewrites the ledger excluding every record for the given URL
    ///
    /// Used only by chain resume to discard the last, possibly partial,
    /// attempt before refetching it.
    pub fn remove_by_url(&self, url: &str) -> LedgerResult<()> {
        let records = self.load()?;
        let kept: Vec<_> = records.into_iter().filter(|r| r.url != url).collect();

        let mut buf = String::from(BOM);
        buf.push_str(HEADER);
        buf.push('\n');
        for record in &kept {
            buf.push_str(&record.to_row());
            buf.push('\n');
        }

        std::fs::write(&self.path, buf)?;
        Ok(())
    }

    /// Deletes the ledger file, if present
    pub fn clear(&self) -> LedgerResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
