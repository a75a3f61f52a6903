use std::io;

use amf::{AmfObject, Value, amf0::mapping};
use utils::traits::writer::WriteTo;

use super::{CommandRequest, errors::CommandMessageError};

/// Composes AMF0 command payloads: `name, transaction id, arguments...`.
#[derive(Debug)]
pub struct Writer<W> {
    inner: W,
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_header(
        &mut self,
        procedure_name: &str,
        transaction_id: f64,
    ) -> Result<(), CommandMessageError> {
        Value::write_string(&mut self.inner, procedure_name)?;
        Value::write_number(&mut self.inner, transaction_id)?;
        Ok(())
    }

    pub fn write_value(&mut self, value: &Value) -> Result<(), CommandMessageError> {
        value.write_to(&mut self.inner)?;
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<(), CommandMessageError> {
        Value::write_null(&mut self.inner)?;
        Ok(())
    }

    /// Writes a typed command object through its cached field layout.
    pub fn write_object<T: AmfObject>(&mut self, value: &T) -> Result<(), CommandMessageError> {
        mapping::write_object(&mut self.inner, value)?;
        Ok(())
    }
}

impl<W: io::Write> WriteTo<W> for CommandRequest {
    type Error = CommandMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        let mut command_writer = Writer::new(writer);
        command_writer.write_header(&self.procedure_name, self.transaction_id)?;
        for argument in &self.arguments {
            command_writer.write_value(argument)?;
        }
        Ok(())
    }
}
