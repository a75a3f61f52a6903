use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported protocol version: {0}")]
    BadVersion(u8),
    #[error("no valid digest found in the peer's handshake block")]
    DigestMismatch,
}

pub type HandshakeResult<T> = Result<T, HandshakeError>;
