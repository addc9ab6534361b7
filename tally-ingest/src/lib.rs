//! tally-ingest: CSV persistence for ledger transactions with per-row error recovery.

pub mod csv_store;
pub mod error;

pub use csv_store::{
    LoadReport, RejectedRow, append_record, load_records, read_records, save_records, write_records,
};
pub use error::IngestError;
