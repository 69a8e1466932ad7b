use std::fmt;
use std::io;

use thiserror::Error;
use wasm_bindgen::JsValue;

/// A value was parseable but violates a domain constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} '{value}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, value: impl fmt::Display, reason: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

/// Coarse classification of a [`GpxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Validation,
    Io,
}

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("XML parse error at {path} (byte {position}): {source}")]
    Xml {
        path: String,
        position: u64,
        source: quick_xml::Error,
    },
    #[error("Format error at {path} (byte {position}): {message}")]
    Format {
        path: String,
        position: u64,
        message: String,
    },
    #[error("Invalid value at {path}: {source}")]
    Validation {
        path: String,
        source: ValidationError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl GpxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Xml { .. } | Self::Format { .. } => ErrorKind::Format,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Element path where reading failed, e.g. `/gpx/trk/trkseg/trkpt/ele`.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Xml { path, .. } | Self::Format { path, .. } | Self::Validation { path, .. } => {
                Some(path)
            }
            Self::Io(_) => None,
        }
    }

    /// Classify a quick-xml error, keeping I/O faults apart from syntax errors.
    pub(crate) fn from_xml(err: quick_xml::Error, path: String, position: u64) -> Self {
        match err {
            quick_xml::Error::Io(io_err) => Self::Io(io::Error::new(io_err.kind(), io_err.to_string())),
            source => Self::Xml {
                path,
                position,
                source,
            },
        }
    }
}

impl From<quick_xml::Error> for GpxError {
    fn from(e: quick_xml::Error) -> Self {
        Self::from_xml(e, String::new(), 0)
    }
}

impl From<ValidationError> for GpxError {
    fn from(e: ValidationError) -> Self {
        Self::Validation {
            path: String::new(),
            source: e,
        }
    }
}

impl From<GpxError> for JsValue {
    fn from(e: GpxError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
