use std::io;

use byteorder::ReadBytesExt;

use super::{
    CommandReply,
    errors::{CommandMessageError, CommandMessageResult},
};

#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
}

impl<R> Reader<R>
where
    R: io::Read,
{
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads an inbound command: name, transaction id, and the raw
    /// remainder. An AMF3 command payload leads with a format-selector
    /// byte that must pick the AMF0 fallback.
    pub fn read_reply(&mut self, version: amf::Version) -> CommandMessageResult<CommandReply> {
        if version == amf::Version::Amf3 {
            let selector = self.inner.read_u8()?;
            if selector != 0 {
                return Err(CommandMessageError::UnsupportedAmf3Encoding(selector));
            }
        }
        let mut amf_reader = amf::Reader::new(&mut self.inner);
        let command_name = amf_reader.read_string()?;
        let transaction_id = amf_reader.read_f64()?;
        let mut rest = Vec::new();
        self.inner.read_to_end(&mut rest)?;
        Ok(CommandReply {
            command_name,
            transaction_id,
            payload: rest.into(),
        })
    }
}
