use std::io;

use thiserror::Error;

use amf::errors::AmfError;
use rtmp_formats::{
    chunk::errors::ChunkMessageError, commands::errors::CommandMessageError,
    handshake::errors::HandshakeError,
};

use crate::request::RemoteCallError;

#[derive(Debug, Error)]
pub enum RtmpClientError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
    #[error("chunk layer error: {0}")]
    ChunkMessage(#[from] ChunkMessageError),
    #[error("command codec error: {0}")]
    Command(#[from] CommandMessageError),
    #[error("amf error: {0}")]
    Amf(#[from] AmfError),
    #[error("request deadline elapsed")]
    RequestTimeout,
    #[error(transparent)]
    Remote(#[from] RemoteCallError),
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("connection closed")]
    ConnectionClosed,
}

pub type RtmpClientResult<T> = Result<T, RtmpClientError>;
