/// Largest value the 24-bit timestamp field can carry before the
/// extended-timestamp escape kicks in.
pub const MAX_TIMESTAMP: u32 = 0xFFFFFF;

/// Chunk payload size every connection starts with, until a set-chunk-size
/// message changes it.
pub const INIT_CHUNK_SIZE: u32 = 128;

/// The chunk size field is 31 bits wide.
pub const MAX_CHUNK_SIZE: u32 = 0x7FFF_FFFF;

/// Well-known chunk stream ids.
pub mod csid {
    pub const PROTOCOL_CONTROL: u8 = 0x02;
    pub const NET_CONNECTION_COMMAND: u8 = 0x03;
    pub const NET_STREAM_COMMAND: u8 = 0x05;
    pub const VIDEO: u8 = 0x06;
    pub const AUDIO: u8 = 0x07;
}
