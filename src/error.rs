//! Crate-level error type for the conversion pipelines.

use std::fmt;

use crate::shacl_parser::ShaclParseError;
use crate::shacl_writer::ShaclWriteError;
use crate::shex_parser::ShexParseError;

#[derive(Debug)]
pub enum Error {
    ShexParse(ShexParseError),
    ShaclParse(ShaclParseError),
    ShaclWrite(ShaclWriteError),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShexParse(e) => write!(f, "{e}"),
            Error::ShaclParse(e) => write!(f, "{e}"),
            Error::ShaclWrite(e) => write!(f, "{e}"),
            Error::Json(e) => write!(f, "canonical JSON error: {e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ShexParse(e) => Some(e),
            Error::ShaclParse(e) => Some(e),
            Error::ShaclWrite(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<ShexParseError> for Error {
    fn from(e: ShexParseError) -> Self {
        Error::ShexParse(e)
    }
}

impl From<ShaclParseError> for Error {
    fn from(e: ShaclParseError) -> Self {
        Error::ShaclParse(e)
    }
}

impl From<ShaclWriteError> for Error {
    fn from(e: ShaclWriteError) -> Self {
        Error::ShaclWrite(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
