use std::io;

use super::{C0S0Packet, C1S1Packet, C2S2Packet, consts::RTMP_HANDSHAKE_RANDOM_SIZE};
use byteorder::{BigEndian, ReadBytesExt};
use utils::traits::reader::ReadFrom;

impl<R: io::Read> ReadFrom<R> for C0S0Packet {
    type Error = super::errors::HandshakeError;
    fn read_from(reader: &mut R) -> Result<Self, Self::Error> {
        let version = reader.read_u8()?;
        Ok(C0S0Packet {
            version: version.try_into()?,
        })
    }
}

impl<R: io::Read> ReadFrom<R> for C1S1Packet {
    type Error = super::errors::HandshakeError;
    fn read_from(reader: &mut R) -> Result<Self, Self::Error> {
        let timestamp = reader.read_u32::<BigEndian>()?;
        let zeros = reader.read_u32::<BigEndian>()?;
        let mut random_bytes = [0; RTMP_HANDSHAKE_RANDOM_SIZE];
        reader.read_exact(&mut random_bytes)?;
        Ok(C1S1Packet {
            timestamp,
            zeros,
            random_bytes,
        })
    }
}

impl<R: io::Read> ReadFrom<R> for C2S2Packet {
    type Error = super::errors::HandshakeError;
    fn read_from(reader: &mut R) -> Result<Self, Self::Error> {
        let timestamp = reader.read_u32::<BigEndian>()?;
        let timestamp2 = reader.read_u32::<BigEndian>()?;
        let mut random_echo = [0; RTMP_HANDSHAKE_RANDOM_SIZE];
        reader.read_exact(&mut random_echo)?;
        Ok(C2S2Packet {
            timestamp,
            timestamp2,
            random_echo,
        })
    }
}
