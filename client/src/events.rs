use amf::Value;
use tokio_util::bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Data,
    SharedObject,
    Aggregate,
}

/// Everything the peer pushes at us outside of request/reply correlation,
/// keyed by logical stream id where one applies.
#[derive(Debug)]
pub enum SessionEvent {
    StreamBegin {
        stream_id: u32,
    },
    StreamEof {
        stream_id: u32,
    },
    StreamDry {
        stream_id: u32,
    },
    StreamIsRecorded {
        stream_id: u32,
    },
    PingResponse {
        timestamp: u32,
    },
    /// A server-initiated command such as `onStatus`.
    Command {
        name: String,
        transaction_id: f64,
        arguments: Vec<Value>,
        stream_id: u32,
    },
    /// Audio, video, and data payloads pass through opaque.
    Media {
        stream_id: u32,
        timestamp: u32,
        kind: MediaKind,
        payload: Bytes,
    },
}
