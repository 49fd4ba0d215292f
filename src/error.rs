use thiserror::Error;

use crate::data::model::UnknownField;

/// Failures a record source surfaces to the dashboard.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source could not deliver data (I/O, parse or server failure).
    #[error("Record source unavailable: {message}")]
    Unavailable { message: String },

    #[error(transparent)]
    UnknownField(#[from] UnknownField),
}

impl SourceError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        SourceError::Unavailable {
            message: err.to_string(),
        }
    }
}
