use std::io;

use crate::chunk::errors::ChunkMessageError;

use super::{UserControlEvent, UserControlEventType};
use byteorder::{BigEndian, WriteBytesExt};
use utils::traits::writer::WriteTo;

impl<W: io::Write> WriteTo<W> for UserControlEvent {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        match self {
            UserControlEvent::StreamBegin { stream_id } => {
                writer.write_u16::<BigEndian>(UserControlEventType::StreamBegin.into())?;
                writer.write_u32::<BigEndian>(*stream_id)?;
            }
            UserControlEvent::StreamEOF { stream_id } => {
                writer.write_u16::<BigEndian>(UserControlEventType::StreamEOF.into())?;
                writer.write_u32::<BigEndian>(*stream_id)?;
            }
            UserControlEvent::StreamDry { stream_id } => {
                writer.write_u16::<BigEndian>(UserControlEventType::StreamDry.into())?;
                writer.write_u32::<BigEndian>(*stream_id)?;
            }
            UserControlEvent::SetBufferLength {
                stream_id,
                buffer_length,
            } => {
                writer.write_u16::<BigEndian>(UserControlEventType::SetBufferLength.into())?;
                writer.write_u32::<BigEndian>(*stream_id)?;
                writer.write_u32::<BigEndian>(*buffer_length)?;
            }
            UserControlEvent::StreamIdsRecorded { stream_id } => {
                writer.write_u16::<BigEndian>(UserControlEventType::StreamIdsRecorded.into())?;
                writer.write_u32::<BigEndian>(*stream_id)?;
            }
            UserControlEvent::PingRequest { timestamp } => {
                writer.write_u16::<BigEndian>(UserControlEventType::PingRequest.into())?;
                writer.write_u32::<BigEndian>(*timestamp)?;
            }
            UserControlEvent::PingResponse { timestamp } => {
                writer.write_u16::<BigEndian>(UserControlEventType::PingResponse.into())?;
                writer.write_u32::<BigEndian>(*timestamp)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::traits::reader::ReadFrom;

    #[test]
    fn round_trip() {
        let events = [
            UserControlEvent::StreamBegin { stream_id: 1 },
            UserControlEvent::StreamEOF { stream_id: 2 },
            UserControlEvent::StreamDry { stream_id: 3 },
            UserControlEvent::SetBufferLength {
                stream_id: 1,
                buffer_length: 3000,
            },
            UserControlEvent::StreamIdsRecorded { stream_id: 1 },
            UserControlEvent::PingRequest { timestamp: 42 },
            UserControlEvent::PingResponse { timestamp: 42 },
        ];
        for event in events {
            let mut bytes = Vec::new();
            event.write_to(&mut bytes).unwrap();
            assert_eq!(UserControlEvent::read_from(&mut &bytes[..]).unwrap(), event);
        }
    }
}
