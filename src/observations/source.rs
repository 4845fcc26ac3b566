//! # Telemetry sources
//!
//! The dataset loader never opens files or sockets on its own: it reads from a
//! [`TelemetrySource`], a capability that hands out a byte stream of comma-separated rows.
//!
//! Two sources are provided:
//! * [`CsvFile`] – a file on the local filesystem,
//! * [`InMemorySource`] – an owned buffer (tests, data produced by another process,
//!   payloads already fetched by an upstream client).
//!
//! Any upstream telemetry service is integrated by implementing [`TelemetrySource`]
//! for its client; the loader and the detectors stay unchanged.
use std::fs::File;
use std::io::{BufReader, Cursor, Read};

use camino::{Utf8Path, Utf8PathBuf};

use crate::alert_errors::AlertError;

/// A provider of comma-separated telemetry rows.
pub trait TelemetrySource {
    /// Open a fresh reader positioned at the header row.
    fn open(&self) -> Result<Box<dyn Read + '_>, AlertError>;

    /// Human readable name used in logs and error messages.
    fn describe(&self) -> String;
}

/// A comma-separated file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    path: Utf8PathBuf,
}

impl CsvFile {
    pub fn new(path: impl AsRef<Utf8Path>) -> Self {
        CsvFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl TelemetrySource for CsvFile {
    fn open(&self) -> Result<Box<dyn Read + '_>, AlertError> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        self.path.to_string()
    }
}

/// Telemetry rows already held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemorySource {
    name: String,
    content: Vec<u8>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        InMemorySource {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl TelemetrySource for InMemorySource {
    fn open(&self) -> Result<Box<dyn Read + '_>, AlertError> {
        Ok(Box::new(Cursor::new(self.content.as_slice())))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
