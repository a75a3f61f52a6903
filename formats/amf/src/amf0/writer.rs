use std::io;

use crate::errors::{AmfError, AmfResult};

use byteorder::{BigEndian, WriteBytesExt};
use utils::traits::writer::WriteTo;

use super::{Value, amf0_marker};

impl<W: io::Write> WriteTo<W> for Value {
    type Error = AmfError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        match self {
            Value::Number(n) => Self::write_number(writer, *n),
            Value::Boolean(b) => Self::write_boolean(writer, *b),
            Value::String(s) => Self::write_string(writer, s),
            Value::Object {
                class_name,
                entries,
            } => match class_name {
                Some(name) => Self::write_typed_object(writer, name, entries),
                None => Self::write_anonymous_object(writer, entries),
            },
            Value::Null => Self::write_null(writer),
            Value::Undefined => Self::write_undefined(writer),
            Value::Reference { index } => Self::write_reference(writer, *index),
            Value::ECMAArray(entries) => Self::write_ecma_array(writer, entries),
            Value::ObjectEnd => Self::write_object_end(writer),
            Value::StrictArray(values) => Self::write_strict_array(writer, values),
            Value::Date { millis } => Self::write_date(writer, *millis),
            Value::XMLDocument(xml) => Self::write_xml(writer, xml),
        }
    }
}

impl Value {
    pub fn write_number<W: io::Write + ?Sized>(writer: &mut W, v: f64) -> AmfResult<()> {
        writer.write_u8(amf0_marker::NUMBER)?;
        writer.write_f64::<BigEndian>(v)?;
        Ok(())
    }

    pub fn write_boolean<W: io::Write + ?Sized>(writer: &mut W, v: bool) -> AmfResult<()> {
        writer.write_u8(amf0_marker::BOOLEAN)?;
        writer.write_u8(v as u8)?;
        Ok(())
    }

    /// Object keys always use the 16-bit length form; longer keys are a
    /// caller error.
    pub(crate) fn write_key<W: io::Write + ?Sized>(writer: &mut W, v: &str) -> AmfResult<()> {
        if v.len() > 0xFFFF {
            return Err(AmfError::KeyTooLong { length: v.len() });
        }
        writer.write_u16::<BigEndian>(v.len() as u16)?;
        writer.write_all(v.as_bytes())?;
        Ok(())
    }

    fn write_long_string_inner<W: io::Write + ?Sized>(writer: &mut W, v: &str) -> AmfResult<()> {
        writer.write_u32::<BigEndian>(v.len() as u32)?;
        writer.write_all(v.as_bytes())?;
        Ok(())
    }

    pub fn write_string<W: io::Write + ?Sized>(writer: &mut W, v: &str) -> AmfResult<()> {
        if v.len() <= 0xFFFF {
            writer.write_u8(amf0_marker::STRING)?;
            Self::write_key(writer, v)?;
        } else {
            writer.write_u8(amf0_marker::LONG_STRING)?;
            Self::write_long_string_inner(writer, v)?;
        }
        Ok(())
    }

    fn write_pairs_inner<W: io::Write>(
        writer: &mut W,
        entries: &[(String, Value)],
    ) -> AmfResult<()> {
        for (key, value) in entries {
            Self::write_key(writer, key)?;
            value.write_to(writer)?;
        }
        writer.write_u16::<BigEndian>(0)?;
        writer.write_u8(amf0_marker::OBJECT_END)?;
        Ok(())
    }

    pub fn write_anonymous_object<W: io::Write>(
        writer: &mut W,
        entries: &[(String, Value)],
    ) -> AmfResult<()> {
        writer.write_u8(amf0_marker::OBJECT)?;
        Self::write_pairs_inner(writer, entries)?;
        Ok(())
    }

    pub fn write_typed_object<W: io::Write>(
        writer: &mut W,
        name: &str,
        entries: &[(String, Value)],
    ) -> AmfResult<()> {
        writer.write_u8(amf0_marker::TYPED_OBJECT)?;
        Self::write_key(writer, name)?;
        Self::write_pairs_inner(writer, entries)?;
        Ok(())
    }

    pub fn write_null<W: io::Write + ?Sized>(writer: &mut W) -> AmfResult<()> {
        writer.write_u8(amf0_marker::NULL)?;
        Ok(())
    }

    pub fn write_undefined<W: io::Write + ?Sized>(writer: &mut W) -> AmfResult<()> {
        writer.write_u8(amf0_marker::UNDEFINED)?;
        Ok(())
    }

    pub fn write_reference<W: io::Write + ?Sized>(writer: &mut W, index: u16) -> AmfResult<()> {
        writer.write_u8(amf0_marker::REFERENCE)?;
        writer.write_u16::<BigEndian>(index)?;
        Ok(())
    }

    pub fn write_ecma_array<W: io::Write>(
        writer: &mut W,
        entries: &[(String, Value)],
    ) -> AmfResult<()> {
        writer.write_u8(amf0_marker::ECMA_ARRAY)?;
        writer.write_u32::<BigEndian>(entries.len() as u32)?;
        Self::write_pairs_inner(writer, entries)?;
        Ok(())
    }

    fn write_object_end<W: io::Write + ?Sized>(writer: &mut W) -> AmfResult<()> {
        writer.write_u8(amf0_marker::OBJECT_END)?;
        Ok(())
    }

    pub fn write_strict_array<W: io::Write>(
        writer: &mut W,
        values: &[Value],
    ) -> AmfResult<()> {
        writer.write_u8(amf0_marker::STRICT_ARRAY)?;
        writer.write_u32::<BigEndian>(values.len() as u32)?;
        for v in values {
            v.write_to(writer)?;
        }
        Ok(())
    }

    /// Milliseconds since the unix epoch; the legacy timezone field is
    /// defined to be zero.
    pub fn write_date<W: io::Write + ?Sized>(writer: &mut W, millis: f64) -> AmfResult<()> {
        writer.write_u8(amf0_marker::DATE)?;
        writer.write_f64::<BigEndian>(millis)?;
        writer.write_i16::<BigEndian>(0)?;
        Ok(())
    }

    pub fn write_xml<W: io::Write + ?Sized>(writer: &mut W, xml: &str) -> AmfResult<()> {
        writer.write_u8(amf0_marker::XML_DOCUMENT)?;
        Self::write_long_string_inner(writer, xml)?;
        Ok(())
    }
}
