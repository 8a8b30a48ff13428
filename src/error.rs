use std::{
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
};
use thiserror::Error;

pub type RsidxResult<T> = std::result::Result<T, RsidxError>;

#[derive(Debug, Error)]
pub enum RsidxError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error("Required column '{column}' not found in header of {}", path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("Empty input file: {}", path.display())]
    EmptyInput { path: PathBuf },
    #[error("Invalid gzip header: {}", path.display())]
    InvalidGzipHeader { path: PathBuf },
    #[error("Format '{format}' requires the {field} column, but it is not present in the input")]
    MissingFormatField {
        format: &'static str,
        field: &'static str,
    },
}

impl RsidxError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[macro_export]
macro_rules! rsidx_error {
    ($($arg:tt)*) => {
        $crate::error::RsidxError::message(format!($($arg)*))
    };
}
