/// Protocol control messages always travel on message stream 0.
pub const PROTOCOL_CONTROL_MESSAGE_STREAM_ID: u8 = 0;
/// And on chunk stream 2.
pub const PROTOCOL_CONTROL_CSID: u8 = 2;
