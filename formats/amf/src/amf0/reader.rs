use std::io;
use std::io::Read as _;

use byteorder::{BigEndian, ReadBytesExt};

use crate::errors::{AmfError, AmfResult};

use super::{Value, amf0_marker};

/// Decodes AMF0 values from a byte stream.
///
/// Besides whole-value reads, the reader offers typed reads with the
/// permissive coercions the RTMP command plane relies on, and a skip
/// facility that walks a full value of arbitrary type so unknown fields
/// never desynchronize the stream. A typed read hitting an unexpected
/// marker first skips that value, then reports the mismatch; the cursor
/// always lands on the next value boundary.
#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
    referenceable: Vec<Value>,
}

impl<R> Reader<R> {
    /// Unwraps this `Reader`, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Get the mutable reference to the underlying reader.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R> Reader<R>
where
    R: io::Read,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            referenceable: Vec::new(),
        }
    }

    /// Reads one complete value. A clean end of stream at the marker byte
    /// yields `None`.
    pub fn read(&mut self) -> AmfResult<Option<Value>> {
        let marker = match self.inner.read_u8() {
            Ok(marker) => marker,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        self.read_value_body(marker).map(Some)
    }

    /// Reads values until the stream ends; used for trailing argument lists.
    pub fn read_all(&mut self) -> AmfResult<Vec<Value>> {
        let mut result = Vec::new();
        while let Some(value) = self.read()? {
            result.push(value);
        }
        Ok(result)
    }

    fn read_value_body(&mut self, marker: u8) -> AmfResult<Value> {
        match marker {
            amf0_marker::NUMBER => self.read_number(),
            amf0_marker::BOOLEAN => self.read_boolean(),
            amf0_marker::STRING => self.read_short_string().map(Value::String),
            amf0_marker::OBJECT => self.read_anonymous_object(),
            amf0_marker::NULL => Ok(Value::Null),
            amf0_marker::UNDEFINED => Ok(Value::Undefined),
            amf0_marker::REFERENCE => self.read_reference(),
            amf0_marker::ECMA_ARRAY => self.read_ecma_array(),
            amf0_marker::OBJECT_END => Ok(Value::ObjectEnd),
            amf0_marker::STRICT_ARRAY => self.read_strict_array(),
            amf0_marker::DATE => self.read_date_body(),
            amf0_marker::LONG_STRING => self.read_long_string().map(Value::String),
            amf0_marker::XML_DOCUMENT => self.read_long_string().map(Value::XMLDocument),
            amf0_marker::TYPED_OBJECT => self.read_typed_object(),
            amf0_marker::MOVIECLIP | amf0_marker::UNSUPPORTED | amf0_marker::RECORDSET => {
                Err(AmfError::Unsupported { marker })
            }
            _ => Err(AmfError::Unknown { marker }),
        }
    }

    /// Reads a number value. Integer destinations truncate toward zero at
    /// the call site; the wire only ever carries doubles.
    pub fn read_f64(&mut self) -> AmfResult<f64> {
        let marker = self.inner.read_u8()?;
        match marker {
            amf0_marker::NUMBER => Ok(self.inner.read_f64::<BigEndian>()?),
            _ => Err(self.mismatch(marker, "a number")),
        }
    }

    pub fn read_bool(&mut self) -> AmfResult<bool> {
        let marker = self.inner.read_u8()?;
        match marker {
            amf0_marker::BOOLEAN => Ok(self.inner.read_u8()? != 0),
            _ => Err(self.mismatch(marker, "a boolean")),
        }
    }

    /// Reads a string value. `null` and `undefined` stand in for absent
    /// strings on the command plane and decode as the empty string.
    pub fn read_string(&mut self) -> AmfResult<String> {
        let marker = self.inner.read_u8()?;
        match marker {
            amf0_marker::STRING => self.read_short_string(),
            amf0_marker::LONG_STRING | amf0_marker::XML_DOCUMENT => self.read_long_string(),
            amf0_marker::NULL | amf0_marker::UNDEFINED => Ok(String::new()),
            _ => Err(self.mismatch(marker, "a string")),
        }
    }

    /// Reads a date value as milliseconds since the unix epoch.
    pub fn read_date(&mut self) -> AmfResult<f64> {
        let marker = self.inner.read_u8()?;
        match marker {
            amf0_marker::DATE => {
                let millis = self.inner.read_f64::<BigEndian>()?;
                // legacy timezone field, ignored
                self.inner.read_i16::<BigEndian>()?;
                Ok(millis)
            }
            _ => Err(self.mismatch(marker, "a date")),
        }
    }

    // resynchronize: drop the unexpected value, then report what it was
    pub(crate) fn mismatch(&mut self, marker: u8, expected: &'static str) -> AmfError {
        match self.skip_value_body(marker) {
            Ok(()) => AmfError::MarkerMismatch { marker, expected },
            Err(err) => err,
        }
    }

    /// Skips one complete value of arbitrary type, descending into
    /// composites. Unknown markers are fatal.
    pub fn skip_value(&mut self) -> AmfResult<()> {
        let marker = self.inner.read_u8()?;
        self.skip_value_body(marker)
    }

    fn skip_value_body(&mut self, marker: u8) -> AmfResult<()> {
        match marker {
            amf0_marker::NUMBER => self.skip_bytes(8),
            amf0_marker::BOOLEAN => self.skip_bytes(1),
            amf0_marker::STRING => self.skip_short_string(),
            amf0_marker::OBJECT => self.skip_pairs(),
            amf0_marker::NULL | amf0_marker::UNDEFINED => Ok(()),
            amf0_marker::REFERENCE => self.skip_bytes(2),
            amf0_marker::ECMA_ARRAY => {
                self.skip_bytes(4)?;
                self.skip_pairs()
            }
            amf0_marker::OBJECT_END => Ok(()),
            amf0_marker::STRICT_ARRAY => {
                let count = self.inner.read_u32::<BigEndian>()?;
                for _ in 0..count {
                    self.skip_value()?;
                }
                Ok(())
            }
            amf0_marker::DATE => self.skip_bytes(10),
            amf0_marker::LONG_STRING | amf0_marker::XML_DOCUMENT => {
                let len = self.inner.read_u32::<BigEndian>()?;
                self.skip_bytes(len as u64)
            }
            amf0_marker::TYPED_OBJECT => {
                self.skip_short_string()?;
                self.skip_pairs()
            }
            amf0_marker::MOVIECLIP | amf0_marker::UNSUPPORTED | amf0_marker::RECORDSET => {
                Err(AmfError::Unsupported { marker })
            }
            _ => Err(AmfError::Unknown { marker }),
        }
    }

    fn skip_short_string(&mut self) -> AmfResult<()> {
        let len = self.inner.read_u16::<BigEndian>()?;
        self.skip_bytes(len as u64)
    }

    fn skip_pairs(&mut self) -> AmfResult<()> {
        loop {
            let len = self.inner.read_u16::<BigEndian>()?;
            if len == 0 {
                let marker = self.inner.read_u8()?;
                if marker != amf0_marker::OBJECT_END {
                    return Err(AmfError::InvalidObjectEnd { marker });
                }
                return Ok(());
            }
            self.skip_bytes(len as u64)?;
            self.skip_value()?;
        }
    }

    fn skip_bytes(&mut self, n: u64) -> AmfResult<()> {
        let copied = io::copy(&mut self.inner.by_ref().take(n), &mut io::sink())?;
        if copied < n {
            return Err(AmfError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "short read while skipping a value",
            )));
        }
        Ok(())
    }

    fn read_number(&mut self) -> AmfResult<Value> {
        let number = self.inner.read_f64::<BigEndian>()?;
        Ok(Value::Number(number))
    }

    fn read_boolean(&mut self) -> AmfResult<Value> {
        let byte = self.inner.read_u8()?;
        Ok(Value::Boolean(byte != 0))
    }

    fn read_utf8_inner(&mut self, len: usize) -> AmfResult<String> {
        let mut buffer = vec![0; len];
        self.inner.read_exact(&mut buffer)?;
        let result = String::from_utf8(buffer)?;
        Ok(result)
    }

    pub(crate) fn read_short_string(&mut self) -> AmfResult<String> {
        let len = self.inner.read_u16::<BigEndian>()?;
        self.read_utf8_inner(len as usize)
    }

    fn read_long_string(&mut self) -> AmfResult<String> {
        let len = self.inner.read_u32::<BigEndian>()?;
        self.read_utf8_inner(len as usize)
    }

    fn read_key_value_pairs_inner(&mut self) -> AmfResult<Vec<(String, Value)>> {
        let mut result: Vec<(String, Value)> = Vec::new();
        loop {
            let key = self.read_short_string()?;
            match self.read()? {
                Some(Value::ObjectEnd) if key.is_empty() => break,
                Some(value) => result.push((key, value)),
                None => {
                    return Err(AmfError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "unexpected eof inside an object",
                    )));
                }
            }
        }
        Ok(result)
    }

    fn read_anonymous_object(&mut self) -> AmfResult<Value> {
        self.read_and_record_referenceable_inner(|this| {
            let pairs = this.read_key_value_pairs_inner()?;
            Ok(Value::Object {
                class_name: None,
                entries: pairs,
            })
        })
    }

    fn read_typed_object(&mut self) -> AmfResult<Value> {
        self.read_and_record_referenceable_inner(|this| {
            let name = this.read_short_string()?;
            let pairs = this.read_key_value_pairs_inner()?;
            Ok(Value::Object {
                class_name: Some(name),
                entries: pairs,
            })
        })
    }

    fn read_ecma_array(&mut self) -> AmfResult<Value> {
        self.read_and_record_referenceable_inner(|this| {
            // count hint only, the body is terminated like an object
            let _count = this.inner.read_u32::<BigEndian>()?;
            let pairs = this.read_key_value_pairs_inner()?;
            Ok(Value::ECMAArray(pairs))
        })
    }

    fn read_strict_array(&mut self) -> AmfResult<Value> {
        self.read_and_record_referenceable_inner(|this| {
            let count = this.inner.read_u32::<BigEndian>()? as usize;
            let values = (0..count)
                .map(|_| match this.read() {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(AmfError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "unexpected eof inside a strict array",
                    ))),
                    Err(err) => Err(err),
                })
                .collect::<AmfResult<_>>()?;
            Ok(Value::StrictArray(values))
        })
    }

    fn read_date_body(&mut self) -> AmfResult<Value> {
        let millis = self.inner.read_f64::<BigEndian>()?;
        // legacy timezone field, ignored
        self.inner.read_i16::<BigEndian>()?;
        Ok(Value::Date { millis })
    }

    fn read_reference(&mut self) -> AmfResult<Value> {
        let index = self.inner.read_u16::<BigEndian>()? as usize;
        self.referenceable
            .get(index)
            .ok_or(AmfError::OutOfRangeReference { index })
            .and_then(|v| match *v {
                Value::Null => Err(AmfError::CircularReference { index }),
                _ => Ok(v.clone()),
            })
    }

    fn read_and_record_referenceable_inner<F>(&mut self, f: F) -> AmfResult<Value>
    where
        F: FnOnce(&mut Self) -> AmfResult<Value>,
    {
        let slot = self.referenceable.len();
        self.referenceable.push(Value::Null);
        let result = f(self)?;
        self.referenceable[slot] = result.clone();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::{
        amf0::{Value, amf0_marker},
        errors::AmfError,
    };
    use std::io;

    macro_rules! decode {
        ($bytes:expr) => {
            Reader::new(&$bytes[..]).read()
        };
    }

    #[test]
    fn number() {
        let bytes = [
            0x00, 0x40, 0x09, 0x1e, 0xb8, 0x51, 0xeb, 0x85, 0x1f, // 3.14
        ];
        assert_eq!(decode!(bytes).unwrap().unwrap(), Value::Number(3.14));
    }

    #[test]
    fn boolean() {
        assert_eq!(
            decode!([0x01, 0x01]).unwrap().unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            decode!([0x01, 0x00]).unwrap().unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn string() {
        let bytes = [0x02, 0x00, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f];
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::String("Hello".to_string())
        );
    }

    #[test]
    fn long_string() {
        let mut bytes = vec![0x0C, 0x00, 0x01, 0x00, 0x03];
        bytes.extend("a".repeat(0x10003).into_bytes());
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::String("a".repeat(0x10003))
        );
    }

    #[test]
    fn object() {
        // {one: 1, two: "2"}
        let bytes = [
            0x03, 0x00, 0x03, 0x6f, 0x6e, 0x65, 0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x03, 0x74, 0x77, 0x6f, 0x02, 0x00, 0x01, 0x32, 0x00, 0x00, 0x09,
        ];
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::Object {
                class_name: None,
                entries: vec![
                    ("one".to_string(), Value::Number(1.0)),
                    ("two".to_string(), Value::String("2".to_string())),
                ],
            }
        );
    }

    #[test]
    fn typed_object() {
        let bytes = [
            0x10, 0x00, 0x03, b'a', b'b', b'c', // class name
            0x00, 0x03, b'f', b'o', b'o', 0x05, // foo: null
            0x00, 0x00, 0x09,
        ];
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::Object {
                class_name: Some("abc".to_string()),
                entries: vec![("foo".to_string(), Value::Null)],
            }
        );
    }

    #[test]
    fn ecma_array() {
        let bytes = [
            0x08, 0x00, 0x00, 0x00, 0x01, // count hint
            0x00, 0x01, b'a', 0x02, 0x00, 0x01, b'b', // a: "b"
            0x00, 0x00, 0x09,
        ];
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::ECMAArray(vec![("a".to_string(), Value::String("b".to_string()))])
        );
    }

    #[test]
    fn strict_array() {
        let bytes = [
            0x0A, 0x00, 0x00, 0x00, 0x02, // 2 entries
            0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 1.0
            0x02, 0x00, 0x01, b'2', // "2"
        ];
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::StrictArray(vec![Value::Number(1.0), Value::String("2".to_string())])
        );
    }

    #[test]
    fn date() {
        let mut bytes = vec![0x0B];
        bytes.extend(1_590_796_800_000.0f64.to_be_bytes());
        bytes.extend([0x00, 0x00]);
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::Date {
                millis: 1_590_796_800_000.0
            }
        );
    }

    #[test]
    fn null_and_undefined() {
        assert_eq!(decode!([0x05]).unwrap().unwrap(), Value::Null);
        assert_eq!(decode!([0x06]).unwrap().unwrap(), Value::Undefined);
    }

    #[test]
    fn reference_resolves_to_recorded_object() {
        // {a: {x: 1}, b: ref(1)} where index 1 is the inner object
        let bytes = [
            0x03, // outer object
            0x00, 0x01, b'a', 0x03, // inner object
            0x00, 0x01, b'x', 0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x09, // inner end
            0x00, 0x01, b'b', 0x07, 0x00, 0x01, // reference index 1
            0x00, 0x00, 0x09, // outer end
        ];
        let inner = Value::Object {
            class_name: None,
            entries: vec![("x".to_string(), Value::Number(1.0))],
        };
        assert_eq!(
            decode!(bytes).unwrap().unwrap(),
            Value::Object {
                class_name: None,
                entries: vec![("a".to_string(), inner.clone()), ("b".to_string(), inner)],
            }
        );
    }

    #[test]
    fn unsupported_markers() {
        for marker in [
            amf0_marker::MOVIECLIP,
            amf0_marker::UNSUPPORTED,
            amf0_marker::RECORDSET,
        ] {
            assert!(matches!(
                decode!([marker]),
                Err(AmfError::Unsupported { marker: m }) if m == marker
            ));
        }
    }

    #[test]
    fn unknown_marker() {
        assert!(matches!(
            decode!([0x42]),
            Err(AmfError::Unknown { marker: 0x42 })
        ));
    }

    #[test]
    fn clean_eof_yields_none() {
        assert!(decode!([]).unwrap().is_none());
    }

    #[test]
    fn short_value_is_a_transport_error() {
        let err = decode!([0x00, 0x3f, 0xf0]).unwrap_err();
        match err {
            AmfError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn coercions() {
        // null and undefined read as the empty string
        let mut reader = Reader::new(&[0x05u8, 0x06][..]);
        assert_eq!(reader.read_string().unwrap(), "");
        assert_eq!(reader.read_string().unwrap(), "");

        // integer destinations truncate toward zero
        let bytes = [0x00u8, 0x40, 0x09, 0x1e, 0xb8, 0x51, 0xeb, 0x85, 0x1f];
        let mut reader = Reader::new(&bytes[..]);
        assert_eq!(reader.read_f64().unwrap() as i64, 3);
    }

    #[test]
    fn mismatch_skips_the_value_first() {
        // a boolean where a number is expected, followed by "ok"
        let bytes = [0x01u8, 0x01, 0x02, 0x00, 0x02, b'o', b'k'];
        let mut reader = Reader::new(&bytes[..]);
        assert!(matches!(
            reader.read_f64(),
            Err(AmfError::MarkerMismatch {
                marker: amf0_marker::BOOLEAN,
                expected: "a number",
            })
        ));
        // the cursor resynchronized onto the next value
        assert_eq!(reader.read_string().unwrap(), "ok");
    }

    #[test]
    fn skip_advances_over_nested_composites() {
        // {outer: {inner: [1.0]}, tail: true} then a trailing number
        let bytes = [
            0x03, // object
            0x00, 0x05, b'o', b'u', b't', b'e', b'r', 0x03, // nested object
            0x00, 0x05, b'i', b'n', b'n', b'e', b'r', 0x0A, 0x00, 0x00, 0x00, 0x01, 0x00, 0x3f,
            0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // strict array [1.0]
            0x00, 0x00, 0x09, // nested end
            0x00, 0x04, b't', b'a', b'i', b'l', 0x01, 0x01, // tail: true
            0x00, 0x00, 0x09, // object end
            0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 2.0
        ];
        let mut reader = Reader::new(&bytes[..]);
        reader.skip_value().unwrap();
        assert_eq!(reader.read_f64().unwrap(), 2.0);
        assert!(reader.read().unwrap().is_none());
    }
}
