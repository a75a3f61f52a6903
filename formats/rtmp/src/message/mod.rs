use crate::{
    chunk::errors::ChunkMessageError,
    protocol_control::ProtocolControlMessageType,
};

///! Message type ids shared by the chunk header and the message header.
///! Protocol control ids (1, 2, 3, 5, 6) live in `protocol_control`; this
///! module covers the user plane and the combined classification the
///! dispatcher works from.

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtmpMessageType {
    UserControl = 4,
    Audio = 8,
    Video = 9,
    AMF3Data = 15,
    AMF3SharedObject = 16,
    AMF3Command = 17,
    AMF0Data = 18,
    AMF0SharedObject = 19,
    AMF0Command = 20,
    Aggregate = 22,
}

impl From<RtmpMessageType> for u8 {
    fn from(value: RtmpMessageType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for RtmpMessageType {
    type Error = ChunkMessageError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(RtmpMessageType::UserControl),
            8 => Ok(RtmpMessageType::Audio),
            9 => Ok(RtmpMessageType::Video),
            15 => Ok(RtmpMessageType::AMF3Data),
            16 => Ok(RtmpMessageType::AMF3SharedObject),
            17 => Ok(RtmpMessageType::AMF3Command),
            18 => Ok(RtmpMessageType::AMF0Data),
            19 => Ok(RtmpMessageType::AMF0SharedObject),
            20 => Ok(RtmpMessageType::AMF0Command),
            22 => Ok(RtmpMessageType::Aggregate),
            _ => Err(ChunkMessageError::UnknownMessageType(value)),
        }
    }
}

impl RtmpMessageType {
    pub fn amf_version(&self) -> amf::Version {
        match self {
            RtmpMessageType::AMF3Command
            | RtmpMessageType::AMF3Data
            | RtmpMessageType::AMF3SharedObject => amf::Version::Amf3,
            _ => amf::Version::Amf0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMessageType {
    ProtocolControl(ProtocolControlMessageType),
    RtmpUserMessage(RtmpMessageType),
}

impl TryFrom<u8> for ChunkMessageType {
    type Error = ChunkMessageError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if let Ok(v) = ProtocolControlMessageType::try_from(value) {
            return Ok(ChunkMessageType::ProtocolControl(v));
        }
        if let Ok(v) = RtmpMessageType::try_from(value) {
            return Ok(ChunkMessageType::RtmpUserMessage(v));
        }
        Err(ChunkMessageError::UnknownMessageType(value))
    }
}
