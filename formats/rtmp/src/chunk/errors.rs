use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkMessageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected fmt bits: {0:#b}")]
    UnexpectedFmt(u8),
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),
    #[error("unknown user control event type: {0}")]
    UnknownEventType(u16),
    #[error("invalid csid: {0}")]
    InvalidBasicHeader(String),
    #[error("invalid message header: {0}")]
    InvalidMessageHeader(String),
    #[error("no prior chunk stream state for csid {0}, a type 0 header must come first")]
    MissingContext(u32),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

pub type ChunkMessageResult<T> = Result<T, ChunkMessageError>;
