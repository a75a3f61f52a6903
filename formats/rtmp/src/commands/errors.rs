use std::io;

use thiserror::Error;

use amf::errors::AmfError;

#[derive(Debug, Error)]
pub enum CommandMessageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("amf error: {0}")]
    Amf(#[from] AmfError),
    #[error("amf3 command with format selector {0}, only the amf0 fallback is supported")]
    UnsupportedAmf3Encoding(u8),
}

pub type CommandMessageResult<T> = Result<T, CommandMessageError>;
