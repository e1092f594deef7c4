//! Parses delimited text (comma or tab separated) into `CandidateRecord`s for import.
//!
//! Parsing is tolerant of bad rows: a row that is too short is skipped quietly and a row with an
//! empty name or a quantity or price that is not a positive integer is skipped with a diagnostic.
//! Only the input as a whole can fail, see `ParseError`.

use crate::error::ParseError;
use crate::export::BOM;
use crate::model::{CandidateRecord, ColumnMapping};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::{trace, warn};

/// The field separator, chosen once per document from the header line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    /// Tab if the header line contains a tab, otherwise comma.
    pub fn detect(header_line: &str) -> Self {
        if header_line.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }

    fn byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// A data row that was left out of the import, and why.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SkippedRow {
    /// 1-based line number in the input, leading blank lines included.
    pub line: u64,
    pub reason: String,
}

impl Display for SkippedRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.line, self.reason)
    }
}

/// The result of a successful parse: the accepted records in input order plus diagnostics for
/// the rows that were skipped because of invalid values.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ParsedBatch {
    delimiter: Delimiter,
    records: Vec<CandidateRecord>,
    skipped: Vec<SkippedRow>,
}

impl ParsedBatch {
    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn into_records(self) -> Vec<CandidateRecord> {
        self.records
    }
}

/// Parses `raw` into the candidate records it contains.
pub fn parse(raw: &str) -> Result<Vec<CandidateRecord>, ParseError> {
    parse_batch(raw).map(ParsedBatch::into_records)
}

/// Parses `raw` and keeps the diagnostics for skipped rows alongside the records.
///
/// The function is pure: the same text always produces the same batch.
pub fn parse_batch(raw: &str) -> Result<ParsedBatch, ParseError> {
    // Exported files carry a byte order mark, strip it so they can be imported again. The rest is
    // left untouched so that row numbers match the lines of the input.
    let text = raw.trim_start_matches(BOM);
    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(ParseError::EmptyInput)?;
    let delimiter = Delimiter::detect(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter.byte())
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (ix, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                // A whitespace-only line, the reader drops truly empty ones itself.
                if record.len() == 1 && record[0].is_empty() {
                    continue;
                }
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(ix as u64 + 1);
                rows.push((line, record));
            }
            Err(e) => warn!("Unable to read record {}: {e}", ix + 1),
        }
    }

    if rows.len() < 2 {
        return Err(ParseError::EmptyInput);
    }

    let mut rows = rows.into_iter();
    let headers: Vec<String> = match rows.next() {
        Some((_, header)) => header.iter().map(|h| h.trim().to_lowercase()).collect(),
        None => return Err(ParseError::EmptyInput),
    };
    let mapping = ColumnMapping::resolve(&headers)?;

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (line, row) in rows {
        if row.len() < mapping.required_len() {
            trace!("Row {line}: skipping a row with only {} fields", row.len());
            continue;
        }
        let fields: Vec<&str> = row.iter().collect();
        match validate(&fields, &mapping) {
            Ok(record) => records.push(record),
            Err(reason) => {
                let skip = SkippedRow { line, reason };
                warn!("{skip}");
                skipped.push(skip);
            }
        }
    }

    if records.is_empty() {
        return Err(ParseError::NoValidRows);
    }

    Ok(ParsedBatch {
        delimiter,
        records,
        skipped,
    })
}

/// Accepts a row only when the name is non-empty and both numbers are positive integers.
fn validate(fields: &[&str], mapping: &ColumnMapping) -> Result<CandidateRecord, String> {
    let name = fields[mapping.name()];
    let quantity = fields[mapping.quantity()].parse::<i64>();
    let price = fields[mapping.price()].parse::<i64>();
    match (name.is_empty(), quantity, price) {
        (false, Ok(quantity), Ok(price)) if quantity > 0 && price > 0 => Ok(CandidateRecord::new(
            name,
            quantity.unsigned_abs(),
            price.unsigned_abs(),
        )),
        _ => Err(format!(
            "Skipping - Invalid data (Name: \"{name}\", Qty: {}, Price: {})",
            fields[mapping.quantity()],
            fields[mapping.price()]
        )),
    }
}
