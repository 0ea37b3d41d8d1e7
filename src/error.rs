use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the project mapping store. Kept separate from
/// [`AppError`] so callers can match the recoverable cases: a missing file
/// degrades the report to raw identifiers, a revision conflict asks the
/// editor to start over.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping file '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("mapping file '{}' is unusable: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("mapping file changed on disk since it was loaded")]
    RevisionConflict,

    #[error("mapping file could not be parsed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Database and export failures. These are fatal for the current run; there
/// is no retry.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
