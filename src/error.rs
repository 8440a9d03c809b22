//! Error types for loading, uploading and exporting.

use thiserror::Error;

/// Errors surfaced by the district/site pipeline.
///
/// Rows with missing fields, districts outside the zone table and sites
/// outside every polygon are not errors; they are represented as values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The boundary dataset is missing, corrupt or in an unsupported format.
    #[error("failed to load district data: {0}")]
    DataLoad(String),

    /// The uploaded site list could not be read.
    #[error("invalid site upload: {0}")]
    Upload(String),

    /// Writing a spreadsheet or marker archive failed.
    #[error("export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns whether the error comes from the boundary dataset rather than the request.
    #[must_use]
    pub fn is_data_load(&self) -> bool {
        matches!(self, Self::DataLoad(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
