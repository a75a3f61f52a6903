use crate::chunk::{consts::MAX_CHUNK_SIZE, errors::ChunkMessageError};

use super::{
    AbortMessage, Acknowledgement, ProtocolControlMessage, SetChunkSize, SetPeerBandwidth,
    WindowAckSize,
};
use byteorder::{BigEndian, WriteBytesExt};
use std::io;
use utils::traits::writer::WriteTo;

impl<W: io::Write> WriteTo<W> for ProtocolControlMessage {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        match self {
            ProtocolControlMessage::SetChunkSize(m) => m.write_to(writer),
            ProtocolControlMessage::Abort(m) => m.write_to(writer),
            ProtocolControlMessage::Ack(m) => m.write_to(writer),
            ProtocolControlMessage::WindowAckSize(m) => m.write_to(writer),
            ProtocolControlMessage::SetPeerBandwidth(m) => m.write_to(writer),
        }
    }
}

impl<W: io::Write> WriteTo<W> for SetChunkSize {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ChunkMessageError::InvalidMessage(format!(
                "chunk size out of range: {}",
                self.chunk_size
            )));
        }
        writer.write_u32::<BigEndian>(self.chunk_size)?;
        Ok(())
    }
}

impl<W: io::Write> WriteTo<W> for AbortMessage {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        writer.write_u32::<BigEndian>(self.chunk_stream_id)?;
        Ok(())
    }
}

impl<W: io::Write> WriteTo<W> for Acknowledgement {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        writer.write_u32::<BigEndian>(self.sequence_number)?;
        Ok(())
    }
}

impl<W: io::Write> WriteTo<W> for WindowAckSize {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        writer.write_u32::<BigEndian>(self.size)?;
        Ok(())
    }
}

impl<W: io::Write> WriteTo<W> for SetPeerBandwidth {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        writer.write_u32::<BigEndian>(self.size)?;
        writer.write_u8(self.limit_type as u8)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::traits::reader::ReadRemainingFrom;

    #[test]
    fn round_trip() {
        let messages = [
            ProtocolControlMessage::SetChunkSize(SetChunkSize { chunk_size: 4096 }),
            ProtocolControlMessage::Abort(AbortMessage {
                chunk_stream_id: 42,
            }),
            ProtocolControlMessage::Ack(Acknowledgement {
                sequence_number: 123_456,
            }),
            ProtocolControlMessage::WindowAckSize(WindowAckSize { size: 2_500_000 }),
            ProtocolControlMessage::SetPeerBandwidth(SetPeerBandwidth {
                size: 2_500_000,
                limit_type: super::super::SetPeerBandWidthLimitType::Dynamic,
            }),
        ];
        for message in messages {
            let mut bytes = Vec::new();
            message.write_to(&mut bytes).unwrap();
            let decoded = ProtocolControlMessage::read_remaining_from(
                message.message_type(),
                &mut &bytes[..],
            )
            .unwrap();
            assert_eq!(decoded, message);
        }
    }
}
