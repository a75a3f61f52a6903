use std::{cmp::min, collections::HashMap};

use tokio_util::bytes::{Buf, BytesMut};
use utils::bytes::BytesReader;

use super::{
    ChunkMessage, ChunkMessageCommonHeader, Csid,
    consts::{INIT_CHUNK_SIZE, MAX_TIMESTAMP},
    errors::{ChunkMessageError, ChunkMessageResult},
};

/// Header fields parsed from one chunk, staged before any chunk stream
/// state is touched. State only changes once the chunk's payload run is
/// known to be fully available, so a short buffer never double-applies a
/// delta on retry.
#[derive(Debug)]
enum HeaderUpdate {
    Full {
        timestamp: u32,
        message_length: u32,
        message_type_id: u8,
        message_stream_id: u32,
        extended: bool,
    },
    Stream {
        timestamp_delta: u32,
        message_length: u32,
        message_type_id: u8,
        extended: bool,
    },
    Delta {
        timestamp_delta: u32,
        extended: bool,
    },
    None {
        // extended-timestamp field repeated on fmt 3 chunks of a stream
        // that turned it on
        repeated_delta: Option<u32>,
    },
}

#[derive(Debug)]
struct ChunkAssembly {
    payload: BytesMut,
    total_length: usize,
}

/// Per chunk stream receive state: the last header fields it carried plus
/// the reassembly buffer of the message in flight.
#[derive(Debug, Default)]
struct ReadContext {
    timestamp: u32,
    timestamp_delta: u32,
    extended_timestamp_enabled: bool,
    message_length: u32,
    message_type_id: u8,
    message_stream_id: u32,
    assembly: Option<ChunkAssembly>,
}

enum ChunkProgress {
    /// Not enough buffered bytes for a whole chunk; nothing was consumed.
    NeedMore,
    /// One chunk consumed; carries the message it completed, if any.
    Chunk(Option<ChunkMessage>),
}

/// Reassembles chunk streams into complete messages.
///
/// Fed incrementally from the connection's read buffer: `read_message`
/// consumes as many whole chunks as the buffer holds and returns the first
/// completed message, or `None` once more bytes are needed. Chunks from
/// different chunk streams interleave freely; only chunks with the same
/// csid contribute to the same message.
#[derive(Debug)]
pub struct Reader {
    contexts: HashMap<Csid, ReadContext>,
    chunk_size: usize,
    bytes_received: u32,
    sequence_number: u32,
}

impl Reader {
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
            chunk_size: INIT_CHUNK_SIZE as usize,
            bytes_received: 0,
            sequence_number: 0,
        }
    }

    /// Bytes consumed since the counter was last reset; drives ack emission.
    #[inline]
    pub fn bytes_received(&self) -> u32 {
        self.bytes_received
    }

    pub fn reset_bytes_received(&mut self) {
        self.bytes_received = 0;
    }

    /// Running count of all consumed bytes, the ack sequence number.
    #[inline]
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn set_chunk_size(&mut self, size: usize) -> usize {
        let old_size = self.chunk_size;
        self.chunk_size = size;
        old_size
    }

    /// Drops the partially reassembled message of a chunk stream.
    pub fn abort(&mut self, csid: Csid) {
        if let Some(ctx) = self.contexts.get_mut(&csid) {
            ctx.assembly = None;
        }
    }

    pub fn read_message(&mut self, buf: &mut BytesMut) -> ChunkMessageResult<Option<ChunkMessage>> {
        loop {
            let (consumed, progress) = {
                let mut reader = BytesReader::new(&buf[..]);
                let progress = self.try_read_chunk(&mut reader)?;
                (reader.consumed(), progress)
            };
            match progress {
                ChunkProgress::NeedMore => return Ok(None),
                ChunkProgress::Chunk(message) => {
                    buf.advance(consumed);
                    self.bytes_received = self.bytes_received.wrapping_add(consumed as u32);
                    self.sequence_number = self.sequence_number.wrapping_add(consumed as u32);
                    if let Some(message) = message {
                        return Ok(Some(message));
                    }
                }
            }
        }
    }

    fn try_read_chunk<'a>(
        &mut self,
        reader: &mut BytesReader<'a>,
    ) -> ChunkMessageResult<ChunkProgress> {
        let Some(first) = reader.peek(1) else {
            return Ok(ChunkProgress::NeedMore);
        };
        let first = first[0];
        let fmt = first >> 6;
        let chunk_stream_id = match (first & 0b0011_1111) as u32 {
            0 => {
                let Some(b) = reader.peek(1) else {
                    return Ok(ChunkProgress::NeedMore);
                };
                b[0] as u32 + 64
            }
            1 => {
                let Some(b) = reader.peek(2) else {
                    return Ok(ChunkProgress::NeedMore);
                };
                b[0] as u32 + ((b[1] as u32) << 8) + 64
            }
            id => id,
        };

        let (context_seen, in_progress, prev_extended, prev_length) =
            match self.contexts.get(&chunk_stream_id) {
                Some(ctx) => (
                    true,
                    ctx.assembly.is_some(),
                    ctx.extended_timestamp_enabled,
                    ctx.message_length,
                ),
                None => (false, false, false, 0),
            };
        if !context_seen && fmt != 0 {
            return Err(ChunkMessageError::MissingContext(chunk_stream_id));
        }

        let update = match fmt {
            0 => {
                let Some(b) = reader.peek(11) else {
                    return Ok(ChunkProgress::NeedMore);
                };
                let field = get_u24(b);
                let message_length = get_u24(&b[3..]);
                let message_type_id = b[6];
                let message_stream_id = u32::from_le_bytes([b[7], b[8], b[9], b[10]]);
                let (timestamp, extended) = if field == MAX_TIMESTAMP {
                    let Some(e) = reader.peek(4) else {
                        return Ok(ChunkProgress::NeedMore);
                    };
                    (u32::from_be_bytes([e[0], e[1], e[2], e[3]]), true)
                } else {
                    (field, false)
                };
                HeaderUpdate::Full {
                    timestamp,
                    message_length,
                    message_type_id,
                    message_stream_id,
                    extended,
                }
            }
            1 => {
                let Some(b) = reader.peek(7) else {
                    return Ok(ChunkProgress::NeedMore);
                };
                let field = get_u24(b);
                let message_length = get_u24(&b[3..]);
                let message_type_id = b[6];
                let (timestamp_delta, extended) = if field == MAX_TIMESTAMP {
                    let Some(e) = reader.peek(4) else {
                        return Ok(ChunkProgress::NeedMore);
                    };
                    (u32::from_be_bytes([e[0], e[1], e[2], e[3]]), true)
                } else {
                    (field, false)
                };
                HeaderUpdate::Stream {
                    timestamp_delta,
                    message_length,
                    message_type_id,
                    extended,
                }
            }
            2 => {
                let Some(b) = reader.peek(3) else {
                    return Ok(ChunkProgress::NeedMore);
                };
                let field = get_u24(b);
                let (timestamp_delta, extended) = if field == MAX_TIMESTAMP {
                    let Some(e) = reader.peek(4) else {
                        return Ok(ChunkProgress::NeedMore);
                    };
                    (u32::from_be_bytes([e[0], e[1], e[2], e[3]]), true)
                } else {
                    (field, false)
                };
                HeaderUpdate::Delta {
                    timestamp_delta,
                    extended,
                }
            }
            3 => {
                // extended-timestamp presence is sticky on this chunk stream
                let repeated_delta = if prev_extended {
                    let Some(e) = reader.peek(4) else {
                        return Ok(ChunkProgress::NeedMore);
                    };
                    Some(u32::from_be_bytes([e[0], e[1], e[2], e[3]]))
                } else {
                    None
                };
                HeaderUpdate::None { repeated_delta }
            }
            fmt => return Err(ChunkMessageError::UnexpectedFmt(fmt)),
        };

        if in_progress && !matches!(update, HeaderUpdate::None { .. }) {
            return Err(ChunkMessageError::InvalidMessageHeader(format!(
                "csid {} got a new message header before the previous message completed",
                chunk_stream_id
            )));
        }

        let (cursor, total_length) = match (&update, self.contexts.get(&chunk_stream_id)) {
            (HeaderUpdate::Full { message_length, .. }, _)
            | (HeaderUpdate::Stream { message_length, .. }, _) => (0, *message_length as usize),
            (_, Some(ctx)) => match &ctx.assembly {
                Some(assembly) => (assembly.payload.len(), assembly.total_length),
                None => (0, prev_length as usize),
            },
            (_, None) => (0, prev_length as usize),
        };

        let bytes_need = min(self.chunk_size, total_length - cursor);
        let Some(run) = reader.peek(bytes_need) else {
            return Ok(ChunkProgress::NeedMore);
        };
        reader.commit();

        let ctx = self.contexts.entry(chunk_stream_id).or_default();
        match update {
            HeaderUpdate::Full {
                timestamp,
                message_length,
                message_type_id,
                message_stream_id,
                extended,
            } => {
                ctx.timestamp = timestamp;
                ctx.timestamp_delta = 0;
                ctx.message_length = message_length;
                ctx.message_type_id = message_type_id;
                ctx.message_stream_id = message_stream_id;
                ctx.extended_timestamp_enabled = extended;
            }
            HeaderUpdate::Stream {
                timestamp_delta,
                message_length,
                message_type_id,
                extended,
            } => {
                ctx.timestamp = ctx.timestamp.wrapping_add(timestamp_delta);
                ctx.timestamp_delta = timestamp_delta;
                ctx.message_length = message_length;
                ctx.message_type_id = message_type_id;
                ctx.extended_timestamp_enabled = extended;
            }
            HeaderUpdate::Delta {
                timestamp_delta,
                extended,
            } => {
                ctx.timestamp = ctx.timestamp.wrapping_add(timestamp_delta);
                ctx.timestamp_delta = timestamp_delta;
                ctx.extended_timestamp_enabled = extended;
            }
            HeaderUpdate::None { repeated_delta } => {
                if !in_progress {
                    // a headerless chunk starting a new message re-applies
                    // the cached delta
                    let delta = repeated_delta.unwrap_or(ctx.timestamp_delta);
                    ctx.timestamp = ctx.timestamp.wrapping_add(delta);
                    ctx.timestamp_delta = delta;
                }
            }
        }

        let assembly = ctx.assembly.get_or_insert_with(|| ChunkAssembly {
            payload: BytesMut::with_capacity(total_length),
            total_length,
        });
        assembly.payload.extend_from_slice(run);

        if assembly.payload.len() < assembly.total_length {
            return Ok(ChunkProgress::Chunk(None));
        }

        let payload = std::mem::take(&mut assembly.payload);
        ctx.assembly = None;
        let header = ChunkMessageCommonHeader {
            chunk_stream_id,
            timestamp: ctx.timestamp,
            message_length: ctx.message_length,
            message_type_id: ctx.message_type_id,
            message_stream_id: ctx.message_stream_id,
            extended_timestamp_enabled: ctx.extended_timestamp_enabled,
        };
        Ok(ChunkProgress::Chunk(Some(ChunkMessage { header, payload })))
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn get_u24(b: &[u8]) -> u32 {
    ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32
}
