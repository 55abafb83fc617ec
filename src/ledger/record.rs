//! Ledger record type and CSV row encoding

use crate::ledger::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use std::fmt;

/// Fixed CSV header of the ledger file
pub(crate) const HEADER: &str = "timestamp,url,source_file,parsed_file,book_name,chapter_name,status";

/// Number of columns in a ledger row
pub(crate) const COLUMNS: usize = 7;

/// Outcome status recorded for a fetch attempt
///
/// Only `Success` rows gate refetching; `Failed` rows are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl OutcomeStatus {
    /// Parses a status from its row representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Row representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger row: a single fetch attempt and its outcome
///
/// Append-only; corrections append a new row for the same URL and readers
/// take the latest row per URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,

    /// The fetched URL
    pub url: String,

    /// Archive path of the raw document, empty if none was written
    pub source_file: String,

    /// Path of derived output written by a collaborator, empty if none
    pub parsed_file: String,

    /// Book label, when the extraction collaborator supplied one
    pub book_name: String,

    /// Chapter label, when the extraction collaborator supplied one
    pub chapter_name: String,

    /// Attempt outcome
    pub status: OutcomeStatus,
}

impl LedgerRecord {
    /// Creates a record for an attempt finishing now
    pub fn now(url: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            url: url.into(),
            source_file: String::new(),
            parsed_file: String::new(),
            book_name: String::new(),
            chapter_name: String::new(),
            status,
        }
    }

    /// Sets the raw archive path
    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = path.into();
        self
    }

    /// Sets the book label
    pub fn with_book(mut self, book: impl Into<String>) -> Self {
        self.book_name = book.into();
        self
    }

    /// Sets the chapter label
    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter_name = chapter.into();
        self
    }

    /// Encodes the record as one CSV row (no trailing newline)
    pub fn to_row(&self) -> String {
        let fields = [
            self.timestamp.to_rfc3339(),
            self.url.clone(),
            self.source_file.clone(),
            self.parsed_file.clone(),
            self.book_name.clone(),
            self.chapter_name.clone(),
            self.status.as_str().to_string(),
        ];

        fields
            .iter()
            .map(|f| escape_field(f))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decodes one CSV row; `line` is used for error reporting only
    pub fn from_row(row: &str, line: usize) -> LedgerResult<Self> {
        let fields = split_row(row);
        if fields.len() != COLUMNS {
            return Err(LedgerError::MalformedRow {
                line,
                message: format!("expected {} fields, found {}", COLUMNS, fields.len()),
            });
        }

        let timestamp = DateTime::parse_from_rfc3339(&fields[0])
            .map_err(|e| LedgerError::MalformedRow {
                line,
                message: format!("bad timestamp '{}': {}", fields[0], e),
            })?
            .with_timezone(&Utc);

        let status = OutcomeStatus::parse(&fields[6]).ok_or_else(|| LedgerError::MalformedRow {
            line,
            message: format!("unknown status '{}'", fields[6]),
        })?;

        Ok(Self {
            timestamp,
            url: fields[1].clone(),
            source_file: fields[2].clone(),
            parsed_file: fields[3].clone(),
            book_name: fields[4].clone(),
            chapter_name: fields[5].clone(),
            status,
        })
    }
}

/// Quotes a CSV field when it contains a comma, quote, or newline
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits one CSV row into fields, honoring quoted fields
fn split_row(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = row.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    current.push('"');
                }
                '"' => in_quotes = false,
                _ => current.push(ch),
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => {
                    fields.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }
    }
    fields.push(current);
    fields
}
