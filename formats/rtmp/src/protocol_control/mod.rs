use crate::chunk::errors::ChunkMessageError;

pub mod consts;
pub mod reader;
pub mod writer;

///! @see: 5.4.1. Set Chunk Size (1)
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0|                     chunk size (31 bits)                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetChunkSize {
    pub chunk_size: u32, // 31 bits, in [1, 0x7FFFFFFF]
}

///! @see: 5.4.2. Abort Message (2)
/// Tells the peer to discard the partially received message on the named
/// chunk stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortMessage {
    pub chunk_stream_id: u32,
}

///! @see: 5.4.3. Acknowledgement (3)
/// Total bytes received so far, sent every window-ack-size bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub sequence_number: u32,
}

///! @see: 5.4.4. Window Acknowledgement Size (5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowAckSize {
    pub size: u32,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolControlMessageType {
    SetChunkSize = 1,
    Abort = 2,
    Acknowledgement = 3,
    WindowAckSize = 5,
    SetPeerBandwidth = 6,
}

impl From<ProtocolControlMessageType> for u8 {
    fn from(value: ProtocolControlMessageType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for ProtocolControlMessageType {
    type Error = ChunkMessageError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProtocolControlMessageType::SetChunkSize),
            2 => Ok(ProtocolControlMessageType::Abort),
            3 => Ok(ProtocolControlMessageType::Acknowledgement),
            5 => Ok(ProtocolControlMessageType::WindowAckSize),
            6 => Ok(ProtocolControlMessageType::SetPeerBandwidth),
            _ => Err(ChunkMessageError::UnknownMessageType(value)),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPeerBandWidthLimitType {
    // The peer SHOULD limit its output bandwidth to the indicated window size.
    Hard = 0,
    // The peer SHOULD limit its output bandwidth to the window indicated in
    // this message or the limit already in effect, whichever is smaller.
    Soft = 1,
    // If the previous limit type was Hard, treat this message as though it
    // was marked Hard, otherwise ignore it.
    Dynamic = 2,
}

impl TryFrom<u8> for SetPeerBandWidthLimitType {
    type Error = ChunkMessageError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SetPeerBandWidthLimitType::Hard),
            1 => Ok(SetPeerBandWidthLimitType::Soft),
            2 => Ok(SetPeerBandWidthLimitType::Dynamic),
            _ => Err(ChunkMessageError::InvalidMessage(format!(
                "unknown peer bandwidth limit type: {}",
                value
            ))),
        }
    }
}

///! @see: 5.4.5. Set Peer Bandwidth (6)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPeerBandwidth {
    pub size: u32,
    pub limit_type: SetPeerBandWidthLimitType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolControlMessage {
    SetChunkSize(SetChunkSize),
    Abort(AbortMessage),
    Ack(Acknowledgement),
    WindowAckSize(WindowAckSize),
    SetPeerBandwidth(SetPeerBandwidth),
}

impl ProtocolControlMessage {
    pub fn message_type(&self) -> ProtocolControlMessageType {
        match self {
            ProtocolControlMessage::SetChunkSize(_) => ProtocolControlMessageType::SetChunkSize,
            ProtocolControlMessage::Abort(_) => ProtocolControlMessageType::Abort,
            ProtocolControlMessage::Ack(_) => ProtocolControlMessageType::Acknowledgement,
            ProtocolControlMessage::WindowAckSize(_) => ProtocolControlMessageType::WindowAckSize,
            ProtocolControlMessage::SetPeerBandwidth(_) => {
                ProtocolControlMessageType::SetPeerBandwidth
            }
        }
    }
}
