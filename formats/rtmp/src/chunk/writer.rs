use std::{cmp::min, collections::HashMap};

use tokio::io::AsyncWriteExt;
use utils::bytes::ByteWriter;
use utils::traits::writer::WriteTo;

use crate::protocol_control::{
    Acknowledgement, ProtocolControlMessage, SetChunkSize, WindowAckSize,
    consts::PROTOCOL_CONTROL_MESSAGE_STREAM_ID,
};
use crate::user_control::{UserControlEvent, consts::USER_CONTROL_MESSAGE_TYPE};

use super::{
    ChunkBasicHeader, ChunkBasicHeaderType, ChunkMessageHeader, ChunkMessageHeaderType0,
    ChunkMessageHeaderType1, ChunkMessageHeaderType2, ChunkMessageHeaderType3, Csid,
    consts::{INIT_CHUNK_SIZE, MAX_CHUNK_SIZE, MAX_TIMESTAMP, csid},
    errors::{ChunkMessageError, ChunkMessageResult},
};

/// Per chunk stream send state mirroring the receive side: the last header
/// fields written, enabling delta/omit compression of later headers.
#[derive(Debug, Default)]
struct WriteContext {
    timestamp: u32,
    timestamp_delta: u32,
    extended_timestamp_enabled: bool,
    message_length: u32,
    message_type_id: u8,
    message_stream_id: u32,
    seen: bool,
}

/// Serializes messages into chunk runs.
///
/// One `write_message` call composes the whole run for a message back to
/// back in the internal buffer: the leading header (compressed against the
/// chunk stream's cached state where possible) and fmt 3 continuation
/// chunks splitting the payload by the outbound chunk size. `flush_to`
/// hands the accumulated bytes to the transport in a single write.
#[derive(Debug)]
pub struct Writer {
    inner: ByteWriter,
    contexts: HashMap<Csid, WriteContext>,
    chunk_size: u32,
    bytes_written: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            inner: ByteWriter::new(),
            contexts: HashMap::new(),
            chunk_size: INIT_CHUNK_SIZE,
            bytes_written: 0,
        }
    }

    #[inline]
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.inner.len()
    }

    pub fn write_message(
        &mut self,
        chunk_stream_id: Csid,
        timestamp: u32,
        message_type_id: u8,
        message_stream_id: u32,
        payload: &[u8],
    ) -> ChunkMessageResult<()> {
        let start = self.inner.len();
        let message_length = payload.len() as u32;
        let header = self.select_header(
            chunk_stream_id,
            timestamp,
            message_length,
            message_type_id,
            message_stream_id,
        );

        self.write_basic_header(header_fmt(&header), chunk_stream_id)?;
        self.write_message_header(&header)?;

        // the extended field follows the escaped 24-bit field of the leading
        // header and is repeated on every chunk of the run; a headerless
        // leading chunk inherits the stickiness of the chunk stream
        let (extended, extended_value) = match &header {
            ChunkMessageHeader::Type0(h) => (h.timestamp >= MAX_TIMESTAMP, h.timestamp),
            ChunkMessageHeader::Type1(h) => (h.timestamp_delta >= MAX_TIMESTAMP, h.timestamp_delta),
            ChunkMessageHeader::Type2(h) => (h.timestamp_delta >= MAX_TIMESTAMP, h.timestamp_delta),
            ChunkMessageHeader::Type3(_) => {
                let ctx = self.contexts.get(&chunk_stream_id);
                (
                    ctx.map(|c| c.extended_timestamp_enabled).unwrap_or(false),
                    ctx.map(|c| c.timestamp_delta).unwrap_or(0),
                )
            }
        };
        if matches!(header, ChunkMessageHeader::Type3(_)) && extended {
            self.inner
                .reserve(4)
                .copy_from_slice(&extended_value.to_be_bytes());
        }

        let mut written = min(self.chunk_size as usize, payload.len());
        self.inner.reserve(written).copy_from_slice(&payload[..written]);
        while written < payload.len() {
            self.write_basic_header(3, chunk_stream_id)?;
            if extended {
                self.inner
                    .reserve(4)
                    .copy_from_slice(&extended_value.to_be_bytes());
            }
            let run = min(self.chunk_size as usize, payload.len() - written);
            self.inner
                .reserve(run)
                .copy_from_slice(&payload[written..written + run]);
            written += run;
        }

        self.update_context(
            chunk_stream_id,
            &header,
            timestamp,
            message_length,
            message_type_id,
            message_stream_id,
            extended,
        );
        self.bytes_written += self.inner.len() - start;
        Ok(())
    }

    /// Announces and applies a new outbound chunk size.
    pub fn set_chunk_size(&mut self, chunk_size: u32) -> ChunkMessageResult<()> {
        if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            return Err(ChunkMessageError::InvalidMessage(format!(
                "chunk size out of range: {}",
                chunk_size
            )));
        }
        self.write_protocol_control(&ProtocolControlMessage::SetChunkSize(SetChunkSize {
            chunk_size,
        }))?;
        self.chunk_size = chunk_size;
        Ok(())
    }

    pub fn write_acknowledgement(&mut self, sequence_number: u32) -> ChunkMessageResult<()> {
        self.write_protocol_control(&ProtocolControlMessage::Ack(Acknowledgement {
            sequence_number,
        }))
    }

    pub fn write_window_ack_size(&mut self, size: u32) -> ChunkMessageResult<()> {
        self.write_protocol_control(&ProtocolControlMessage::WindowAckSize(WindowAckSize { size }))
    }

    fn write_protocol_control(
        &mut self,
        message: &ProtocolControlMessage,
    ) -> ChunkMessageResult<()> {
        let mut payload = Vec::new();
        message.write_to(&mut payload)?;
        self.write_message(
            csid::PROTOCOL_CONTROL.into(),
            0,
            message.message_type().into(),
            PROTOCOL_CONTROL_MESSAGE_STREAM_ID.into(),
            &payload,
        )
    }

    pub fn write_user_control(&mut self, event: &UserControlEvent) -> ChunkMessageResult<()> {
        let mut payload = Vec::new();
        event.write_to(&mut payload)?;
        self.write_message(
            csid::PROTOCOL_CONTROL.into(),
            0,
            USER_CONTROL_MESSAGE_TYPE,
            PROTOCOL_CONTROL_MESSAGE_STREAM_ID.into(),
            &payload,
        )
    }

    /// Writes the accumulated chunk runs to the transport in one call and
    /// resets the buffer.
    pub async fn flush_to<W>(&mut self, writer: &mut W) -> ChunkMessageResult<()>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        if self.inner.is_empty() {
            return Ok(());
        }
        writer.write_all(self.inner.bytes()).await?;
        writer.flush().await?;
        self.inner.clear();
        Ok(())
    }

    /// Takes the accumulated bytes without touching a transport.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        self.inner.take()
    }

    fn select_header(
        &self,
        chunk_stream_id: Csid,
        timestamp: u32,
        message_length: u32,
        message_type_id: u8,
        message_stream_id: u32,
    ) -> ChunkMessageHeader {
        let full = ChunkMessageHeader::Type0(ChunkMessageHeaderType0 {
            timestamp,
            message_length,
            message_type_id,
            message_stream_id,
        });
        let Some(ctx) = self.contexts.get(&chunk_stream_id) else {
            return full;
        };
        if !ctx.seen || ctx.message_stream_id != message_stream_id {
            return full;
        }
        let Some(delta) = timestamp.checked_sub(ctx.timestamp) else {
            // timestamp went backwards, only an absolute header can express it
            return full;
        };
        if ctx.message_length == message_length && ctx.message_type_id == message_type_id {
            if ctx.timestamp_delta == delta {
                return ChunkMessageHeader::Type3(ChunkMessageHeaderType3 {});
            }
            return ChunkMessageHeader::Type2(ChunkMessageHeaderType2 {
                timestamp_delta: delta,
            });
        }
        ChunkMessageHeader::Type1(ChunkMessageHeaderType1 {
            timestamp_delta: delta,
            message_length,
            message_type_id,
        })
    }

    fn write_basic_header(&mut self, fmt: u8, csid: Csid) -> ChunkMessageResult<()> {
        let header = ChunkBasicHeader::new(fmt, csid)?;
        let fmt = header.fmt << 6;
        match header.header_type {
            ChunkBasicHeaderType::OneByte => {
                self.inner.reserve(1)[0] = fmt | header.chunk_stream_id as u8;
            }
            ChunkBasicHeaderType::TwoBytes => {
                let b = self.inner.reserve(2);
                b[0] = fmt;
                b[1] = (header.chunk_stream_id - 64) as u8;
            }
            ChunkBasicHeaderType::ThreeBytes => {
                // the two id bytes go low byte first
                let id = header.chunk_stream_id - 64;
                let b = self.inner.reserve(3);
                b[0] = fmt | 1;
                b[1] = (id & 0xFF) as u8;
                b[2] = (id >> 8) as u8;
            }
        }
        Ok(())
    }

    fn write_message_header(&mut self, header: &ChunkMessageHeader) -> ChunkMessageResult<()> {
        match header {
            ChunkMessageHeader::Type0(header) => {
                if header.timestamp >= MAX_TIMESTAMP {
                    let b = self.inner.reserve(15);
                    put_u24(&mut b[..3], MAX_TIMESTAMP);
                    put_u24(&mut b[3..6], header.message_length);
                    b[6] = header.message_type_id;
                    b[7..11].copy_from_slice(&header.message_stream_id.to_le_bytes());
                    b[11..15].copy_from_slice(&header.timestamp.to_be_bytes());
                } else {
                    let b = self.inner.reserve(11);
                    put_u24(&mut b[..3], header.timestamp);
                    put_u24(&mut b[3..6], header.message_length);
                    b[6] = header.message_type_id;
                    b[7..11].copy_from_slice(&header.message_stream_id.to_le_bytes());
                }
            }
            ChunkMessageHeader::Type1(header) => {
                if header.timestamp_delta >= MAX_TIMESTAMP {
                    let b = self.inner.reserve(11);
                    put_u24(&mut b[..3], MAX_TIMESTAMP);
                    put_u24(&mut b[3..6], header.message_length);
                    b[6] = header.message_type_id;
                    b[7..11].copy_from_slice(&header.timestamp_delta.to_be_bytes());
                } else {
                    let b = self.inner.reserve(7);
                    put_u24(&mut b[..3], header.timestamp_delta);
                    put_u24(&mut b[3..6], header.message_length);
                    b[6] = header.message_type_id;
                }
            }
            ChunkMessageHeader::Type2(header) => {
                if header.timestamp_delta >= MAX_TIMESTAMP {
                    let b = self.inner.reserve(7);
                    put_u24(&mut b[..3], MAX_TIMESTAMP);
                    b[3..7].copy_from_slice(&header.timestamp_delta.to_be_bytes());
                } else {
                    put_u24(self.inner.reserve(3), header.timestamp_delta);
                }
            }
            ChunkMessageHeader::Type3(_) => {
                // headerless; a sticky extended timestamp is written by the
                // continuation loop
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn update_context(
        &mut self,
        chunk_stream_id: Csid,
        header: &ChunkMessageHeader,
        timestamp: u32,
        message_length: u32,
        message_type_id: u8,
        message_stream_id: u32,
        extended: bool,
    ) {
        let previous_timestamp = self
            .contexts
            .get(&chunk_stream_id)
            .map(|ctx| ctx.timestamp)
            .unwrap_or(0);
        let ctx = self.contexts.entry(chunk_stream_id).or_default();
        ctx.timestamp_delta = match header {
            ChunkMessageHeader::Type0(_) => 0,
            _ => timestamp.wrapping_sub(previous_timestamp),
        };
        ctx.timestamp = timestamp;
        ctx.message_length = message_length;
        ctx.message_type_id = message_type_id;
        ctx.message_stream_id = message_stream_id;
        ctx.extended_timestamp_enabled = extended;
        ctx.seen = true;
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

fn header_fmt(header: &ChunkMessageHeader) -> u8 {
    match header {
        ChunkMessageHeader::Type0(_) => 0,
        ChunkMessageHeader::Type1(_) => 1,
        ChunkMessageHeader::Type2(_) => 2,
        ChunkMessageHeader::Type3(_) => 3,
    }
}

fn put_u24(b: &mut [u8], v: u32) {
    b[0] = (v >> 16) as u8;
    b[1] = (v >> 8) as u8;
    b[2] = v as u8;
}
