use crate::handshake::errors::HandshakeError;

pub mod client;
pub mod consts;
pub mod digest;
pub mod errors;
pub mod reader;
pub mod writer;

/// +-------------+                +-------------+
/// |    Client   | TCP/IP Network |    Server   |
/// +-------------+       |        +-------------+
///        |              |               |
///        |      C0+C1   |               |
///        |------------->|-------------->|
///        |              |    S0+S1+S2   |
///        |<-------------|<--------------|
///        |      C2      |               |
///        |------------->|-------------->|
///   Handshake Done      |          Handshake Done
///
/// After C2 the byte stream carries chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C0S0Packet {
    pub version: Version,
}

pub struct C1S1Packet {
    pub timestamp: u32,
    pub zeros: u32,
    pub random_bytes: [u8; consts::RTMP_HANDSHAKE_RANDOM_SIZE],
}

pub struct C2S2Packet {
    pub timestamp: u32,
    pub timestamp2: u32,
    pub random_echo: [u8; consts::RTMP_HANDSHAKE_RANDOM_SIZE],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

impl From<Version> for u8 {
    fn from(value: Version) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Version {
    type Error = HandshakeError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Version::V0),
            1 => Ok(Version::V1),
            2 => Ok(Version::V2),
            3 => Ok(Version::V3),
            _ => Err(HandshakeError::BadVersion(value)),
        }
    }
}

pub const RTMP_VERSION: Version = Version::V3;
