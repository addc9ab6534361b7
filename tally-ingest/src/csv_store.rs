//! CSV store for transactions.
//!
//! Files carry a header row naming `date,description,amount,category` in any
//! order and case. Extra columns are ignored, missing ones read as empty.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;
use tally_core::{MalformedRecordError, RawRecord, Transaction};
use tracing::{debug, warn};

use crate::error::IngestError;

/// A data row that could not become a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based, header excluded.
    pub row: usize,
    pub error: MalformedRecordError,
}

/// Outcome of a load: the good rows in file order plus everything skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RejectedRow>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Load transactions from a CSV file. A missing file is an empty store.
pub fn load_records(path: impl AsRef<Path>) -> Result<LoadReport, IngestError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no transaction store yet");
        return Ok(LoadReport::default());
    }
    let file = File::open(path)?;
    let report = read_records(file)?;
    debug!(
        path = %path.display(),
        loaded = report.transactions.len(),
        rejected = report.rejected.len(),
        "loaded transaction store"
    );
    Ok(report)
}

/// Read transactions from any CSV source, skipping malformed rows.
pub fn read_records<R: Read>(reader: R) -> Result<LoadReport, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: StringRecord = rdr.headers()?.iter().map(|h| h.to_lowercase()).collect();
    rdr.set_headers(headers);

    let mut report = LoadReport::default();
    for (i, result) in rdr.deserialize::<RawRecord>().enumerate() {
        let row = i + 1;
        let converted = match result {
            Ok(raw) => Transaction::try_from(raw),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(MalformedRecordError::new("record", e.to_string())),
        };
        match converted {
            Ok(t) => report.transactions.push(t),
            Err(error) => {
                warn!(row, %error, "skipping malformed transaction row");
                report.rejected.push(RejectedRow { row, error });
            }
        }
    }
    Ok(report)
}

/// Write transactions to a CSV file, replacing its contents.
pub fn save_records(path: impl AsRef<Path>, transactions: &[Transaction]) -> Result<(), IngestError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_records(file, transactions)?;
    debug!(path = %path.display(), saved = transactions.len(), "saved transaction store");
    Ok(())
}

/// Append one transaction, leaving every existing row untouched, including
/// rows a load would reject.
///
/// A missing or blank file gets the standard header. Otherwise the file keeps
/// its own column order and unknown columns are written blank.
pub fn append_record(path: impl AsRef<Path>, transaction: &Transaction) -> Result<(), IngestError> {
    let path = path.as_ref();
    let existing = if path.exists() { fs::read(path)? } else { Vec::new() };
    if existing.iter().all(u8::is_ascii_whitespace) {
        return save_records(path, std::slice::from_ref(transaction));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(existing.as_slice());
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_lowercase()).collect();
    if !headers.iter().any(|h| h == "amount") {
        return Err(IngestError::MissingColumn("amount"));
    }

    let raw = RawRecord::from(transaction);
    let row: StringRecord = headers
        .iter()
        .map(|h| match h.as_str() {
            "date" => raw.date.as_deref().unwrap_or(""),
            "description" => raw.description.as_deref().unwrap_or(""),
            "amount" => raw.amount.as_deref().unwrap_or(""),
            "category" => raw.category.as_deref().unwrap_or(""),
            _ => "",
        })
        .collect();

    let mut file = OpenOptions::new().append(true).open(path)?;
    if existing.last() != Some(&b'\n') {
        file.write_all(b"\n")?;
    }
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    wtr.write_record(&row)?;
    wtr.flush()?;
    debug!(path = %path.display(), "appended transaction");
    Ok(())
}

pub fn write_records<W: Write>(writer: W, transactions: &[Transaction]) -> Result<(), IngestError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if transactions.is_empty() {
        wtr.write_record(["date", "description", "amount", "category"])?;
    }
    for t in transactions {
        wtr.serialize(RawRecord::from(t))?;
    }
    wtr.flush()?;
    Ok(())
}
