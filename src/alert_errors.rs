use thiserror::Error;

use crate::detector::export::ResultKind;

/// Malformed or incomplete tabular input, raised at the loader boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataFormatError {
    #[error("Required column '{0}' is absent from the header")]
    MissingColumn(String),

    #[error("Unparseable date '{value}' in column '{column}' (line {line})")]
    InvalidDate {
        column: String,
        value: String,
        line: u64,
    },

    #[error("Unparseable number '{value}' in column '{column}' (line {line})")]
    InvalidNumber {
        column: String,
        value: String,
        line: u64,
    },

    #[error("Empty value in required column '{column}' (line {line})")]
    EmptyField { column: String, line: u64 },

    #[error("Line {line} has {found} fields, expected {expected}")]
    RecordLength { line: u64, expected: u64, found: u64 },
}

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Malformed telemetry data in {source_name}: {error}")]
    DataFormat {
        source_name: String,
        error: DataFormatError,
    },

    #[error("Invalid bound type: {0} (expected bound_min or bound_max)")]
    InvalidBoundType(String),

    #[error("Cannot export {0} results: the matching detection was never run")]
    ExportBeforeDetect(ResultKind),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Detection not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid settings file: {0}")]
    SettingsError(#[from] toml::de::Error),

    #[error("Unable to initialize logging: {0}")]
    LoggingInit(String),
}

impl AlertError {
    /// Wrap a [`DataFormatError`] with the description of the source it came from.
    pub fn data_format(source_name: impl Into<String>, error: DataFormatError) -> Self {
        AlertError::DataFormat {
            source_name: source_name.into(),
            error,
        }
    }
}
