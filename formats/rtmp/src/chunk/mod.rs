use errors::{ChunkMessageError, ChunkMessageResult};
use tokio_util::bytes::BytesMut;

pub mod consts;
pub mod errors;
pub mod reader;
pub mod writer;

pub type Csid = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkBasicHeaderType {
    OneByte,
    TwoBytes,
    ThreeBytes,
}

///! @see: 5.3.1.1. Chunk Basic Header
///! 1, 2 or 3 bytes
#[derive(Debug, Clone)]
pub struct ChunkBasicHeader {
    header_type: ChunkBasicHeaderType,
    fmt: u8,               // 2 bits
    chunk_stream_id: Csid, // 6 bits / 1 byte / 2 bytes
}

impl ChunkBasicHeader {
    pub fn new(fmt: u8, csid: Csid) -> ChunkMessageResult<Self> {
        let header_type = match csid {
            id if (2..64).contains(&id) => ChunkBasicHeaderType::OneByte,
            id if (64..320).contains(&id) => ChunkBasicHeaderType::TwoBytes,
            id if (320..65600).contains(&id) => ChunkBasicHeaderType::ThreeBytes,
            _ => {
                return Err(ChunkMessageError::InvalidBasicHeader(format!(
                    "invalid csid: {}",
                    csid
                )));
            }
        };

        Ok(Self {
            header_type,
            fmt,
            chunk_stream_id: csid,
        })
    }

    pub fn chunk_stream_id(&self) -> Csid {
        self.chunk_stream_id
    }
}

///! @see: 5.3.1.2.1. Type 0 - full header, 11 bytes.
///! Starts a chunk stream or rewinds its timestamp; the timestamp field is
///! absolute and replaces the cached value.
#[derive(Debug, Clone)]
pub struct ChunkMessageHeaderType0 {
    pub timestamp: u32,         // 3 bytes (+4 when extended)
    pub message_length: u32,    // 3 bytes
    pub message_type_id: u8,    // 1 byte
    pub message_stream_id: u32, // 4 bytes, little endian
}

///! @see: 5.3.1.2.2. Type 1 - same message stream as the preceding chunk,
///! 7 bytes; the timestamp field is a delta.
#[derive(Debug, Clone)]
pub struct ChunkMessageHeaderType1 {
    pub timestamp_delta: u32, // 3 bytes (+4 when extended)
    pub message_length: u32,  // 3 bytes
    pub message_type_id: u8,  // 1 byte
}

///! @see: 5.3.1.2.3. Type 2 - delta only, 3 bytes.
#[derive(Debug, Clone)]
pub struct ChunkMessageHeaderType2 {
    pub timestamp_delta: u32, // 3 bytes (+4 when extended)
}

///! @see: 5.3.1.2.4. Type 3 - no message header; everything is inherited
///! from the chunk stream's cached state.
#[derive(Debug, Clone)]
pub struct ChunkMessageHeaderType3 {}

#[derive(Debug, Clone)]
pub enum ChunkMessageHeader {
    Type0(ChunkMessageHeaderType0),
    Type1(ChunkMessageHeaderType1),
    Type2(ChunkMessageHeaderType2),
    Type3(ChunkMessageHeaderType3),
}

/// The resolved, absolute view of one chunk's header after delta and
/// inheritance handling.
#[derive(Debug, Clone)]
pub struct ChunkMessageCommonHeader {
    pub chunk_stream_id: Csid,
    pub timestamp: u32,
    pub message_length: u32,
    pub message_type_id: u8,
    pub message_stream_id: u32,
    pub extended_timestamp_enabled: bool,
}

///! @see: 5.3.1. Chunk Format
/// +--------------+----------------+--------------------+--------------+
/// | Basic Header | Message Header | Extended Timestamp |  Chunk Data  |
/// +--------------+----------------+--------------------+--------------+
/// |                                                    |
/// |<------------------- Chunk Header ----------------->|
///
/// A complete message reassembled from one or more chunks. The payload is
/// owned; reassembly buffers never escape the reader.
#[derive(Debug)]
pub struct ChunkMessage {
    pub header: ChunkMessageCommonHeader,
    pub payload: BytesMut,
}
