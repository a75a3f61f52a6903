use std::{io, string};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmfError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid utf8 data: {0}")]
    InvalidUtf8(#[from] string::FromUtf8Error),
    #[error("unsupported amf value marker: {marker:#04x}")]
    Unsupported { marker: u8 },
    #[error("unknown marker: {marker:#04x}")]
    Unknown { marker: u8 },
    #[error("expected {expected}, got marker: {marker:#04x}")]
    MarkerMismatch { marker: u8, expected: &'static str },
    #[error("index of reference out of range, index: {index}")]
    OutOfRangeReference { index: usize },
    #[error("circular reference not supported, index: {index}")]
    CircularReference { index: usize },
    #[error("object key of {length} bytes does not fit the short string form")]
    KeyTooLong { length: usize },
    #[error("malformed object end, got marker: {marker:#04x}")]
    InvalidObjectEnd { marker: u8 },
}

pub type AmfResult<T> = Result<T, AmfError>;
