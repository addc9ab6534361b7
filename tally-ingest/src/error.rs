use thiserror::Error;

/// Failures that abort a whole load or save. Bad rows are reported, not raised.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store has no `{0}` column")]
    MissingColumn(&'static str),
}
