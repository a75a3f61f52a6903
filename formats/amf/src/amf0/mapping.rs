use std::{
    any::{Any, TypeId},
    collections::HashMap,
    io,
    sync::{Arc, RwLock},
};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use once_cell::sync::Lazy;

use crate::errors::{AmfError, AmfResult};

use super::{Reader, Value, amf0_marker};

/// A record type that maps to an AMF0 object.
///
/// `amf_fields` declares the wire name and accessors of every mapped
/// field; the derived [`Layout`] is computed once per type and cached for
/// the lifetime of the process, so implementations are free to build the
/// field list on the fly.
pub trait AmfObject: Sized + 'static {
    fn amf_fields() -> Vec<Field<Self>>;
}

pub type EncodeFieldFn<T> = fn(&T, &mut dyn io::Write) -> AmfResult<()>;
pub type DecodeFieldFn<T> = fn(&mut T, &mut Reader<&mut dyn io::Read>) -> AmfResult<()>;
pub type IsEmptyFn<T> = fn(&T) -> bool;

/// One mapped field of an [`AmfObject`].
pub struct Field<T> {
    name: &'static str,
    omit_empty: bool,
    is_empty: IsEmptyFn<T>,
    encode: EncodeFieldFn<T>,
    decode: DecodeFieldFn<T>,
}

impl<T> Field<T> {
    pub fn required(
        name: &'static str,
        encode: EncodeFieldFn<T>,
        decode: DecodeFieldFn<T>,
    ) -> Self {
        Self {
            name,
            omit_empty: false,
            is_empty: |_| false,
            encode,
            decode,
        }
    }

    /// A field skipped during encoding whenever `is_empty` holds.
    pub fn omit_empty(
        name: &'static str,
        encode: EncodeFieldFn<T>,
        decode: DecodeFieldFn<T>,
        is_empty: IsEmptyFn<T>,
    ) -> Self {
        Self {
            name,
            omit_empty: true,
            is_empty,
            encode,
            decode,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn skipped(&self, value: &T) -> bool {
        self.omit_empty && (self.is_empty)(value)
    }
}

/// The cached field table of one [`AmfObject`] type.
pub struct Layout<T> {
    fields: Vec<Field<T>>,
    index: HashMap<&'static str, usize>,
}

impl<T> Layout<T> {
    fn new(fields: Vec<Field<T>>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name, i))
            .collect();
        Self { fields, index }
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<T>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }
}

static LAYOUTS: Lazy<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(Default::default);

/// Returns the cached layout for `T`, computing and publishing it on the
/// first lookup. Readers share the fast path; only the first access per
/// type takes the write lock.
pub fn layout_of<T: AmfObject>() -> Arc<Layout<T>> {
    let key = TypeId::of::<T>();
    {
        let cache = LAYOUTS.read().expect("layout cache poisoned");
        if let Some(layout) = cache.get(&key) {
            return Arc::clone(layout)
                .downcast::<Layout<T>>()
                .expect("cached layout matches its type id");
        }
    }
    let mut cache = LAYOUTS.write().expect("layout cache poisoned");
    if let Some(layout) = cache.get(&key) {
        return Arc::clone(layout)
            .downcast::<Layout<T>>()
            .expect("cached layout matches its type id");
    }
    let layout = Arc::new(Layout::new(T::amf_fields()));
    cache.insert(key, layout.clone());
    layout
}

/// Encodes `value` as an anonymous AMF0 object following its layout.
pub fn write_object<W, T>(writer: &mut W, value: &T) -> AmfResult<()>
where
    W: io::Write,
    T: AmfObject,
{
    let layout = layout_of::<T>();
    writer.write_u8(amf0_marker::OBJECT)?;
    for field in layout.fields() {
        if field.skipped(value) {
            continue;
        }
        Value::write_key(writer, field.name)?;
        (field.encode)(value, &mut *writer)?;
    }
    writer.write_u16::<BigEndian>(0)?;
    writer.write_u8(amf0_marker::OBJECT_END)?;
    Ok(())
}

impl<R: io::Read> Reader<R> {
    /// Decodes an object (or ecma array) into `T`, pairing entry names
    /// with mapped fields. Unknown names are skipped as whole values so
    /// the stream stays synchronized.
    pub fn read_object<T>(&mut self) -> AmfResult<T>
    where
        T: AmfObject + Default,
    {
        let marker = self.inner_mut().read_u8()?;
        match marker {
            amf0_marker::OBJECT => {}
            amf0_marker::ECMA_ARRAY => {
                self.inner_mut().read_u32::<BigEndian>()?;
            }
            _ => return Err(self.mismatch(marker, "an object")),
        }
        let layout = layout_of::<T>();
        let mut value = T::default();
        loop {
            let name = self.read_short_string()?;
            if name.is_empty() {
                let end = self.inner_mut().read_u8()?;
                if end != amf0_marker::OBJECT_END {
                    return Err(AmfError::InvalidObjectEnd { marker: end });
                }
                break;
            }
            match layout.field(&name) {
                Some(field) => {
                    let mut field_reader = Reader::new(self.inner_mut() as &mut dyn io::Read);
                    (field.decode)(&mut value, &mut field_reader)?;
                }
                None => self.skip_value()?,
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{AmfObject, Field, layout_of, write_object};
    use crate::amf0::{Reader, Value};

    #[derive(Debug, Default, PartialEq)]
    struct Endpoint {
        app: String,
        capabilities: u16,
        tc_url: String,
    }

    impl AmfObject for Endpoint {
        fn amf_fields() -> Vec<Field<Self>> {
            vec![
                Field::required(
                    "app",
                    |v, w| Value::write_string(w, &v.app),
                    |v, r| {
                        v.app = r.read_string()?;
                        Ok(())
                    },
                ),
                Field::required(
                    "capabilities",
                    |v, w| Value::write_number(w, v.capabilities as f64),
                    |v, r| {
                        v.capabilities = r.read_f64()? as u16;
                        Ok(())
                    },
                ),
                Field::omit_empty(
                    "tcUrl",
                    |v, w| Value::write_string(w, &v.tc_url),
                    |v, r| {
                        v.tc_url = r.read_string()?;
                        Ok(())
                    },
                    |v| v.tc_url.is_empty(),
                ),
            ]
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct One {
        one: f64,
    }

    impl AmfObject for One {
        fn amf_fields() -> Vec<Field<Self>> {
            vec![Field::required(
                "one",
                |v, w| Value::write_number(w, v.one),
                |v, r| {
                    v.one = r.read_f64()?;
                    Ok(())
                },
            )]
        }
    }

    fn encode<T: AmfObject>(value: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        write_object(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn round_trip() {
        let value = Endpoint {
            app: "live".to_string(),
            capabilities: 239,
            tc_url: "rtmp://localhost/live".to_string(),
        };
        let bytes = encode(&value);
        let decoded: Endpoint = Reader::new(&bytes[..]).read_object().unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn omit_empty_skips_the_field() {
        let value = Endpoint {
            app: "live".to_string(),
            capabilities: 239,
            tc_url: String::new(),
        };
        let bytes = encode(&value);
        let entries = Reader::new(&bytes[..])
            .read()
            .unwrap()
            .unwrap()
            .try_into_pairs()
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|(name, _)| name != "tcUrl"));
        // and the omitted field decodes as its default
        let decoded: Endpoint = Reader::new(&bytes[..]).read_object().unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn unknown_entries_are_skipped() {
        // {one: 1, shadow: null}: the unmapped entry must not derail the cursor
        let bytes = [
            0x03, 0x00, 0x03, b'o', b'n', b'e', 0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x06, b's', b'h', b'a', b'd', b'o', b'w', 0x05, 0x00, 0x00, 0x09,
        ];
        let mut reader = Reader::new(&bytes[..]);
        let decoded: One = reader.read_object().unwrap();
        assert_eq!(decoded, One { one: 1.0 });
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn mismatched_marker_resynchronizes() {
        // a string where the object should be, followed by a number
        let bytes = [
            0x02, 0x00, 0x02, b'n', b'o', 0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut reader = Reader::new(&bytes[..]);
        assert!(reader.read_object::<One>().is_err());
        assert_eq!(reader.read_f64().unwrap(), 1.0);
    }

    #[test]
    fn layouts_are_cached_per_type() {
        let first = layout_of::<Endpoint>();
        let second = layout_of::<Endpoint>();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(first.fields().len(), 3);
        assert!(first.field("tcUrl").is_some());
        assert!(first.field("nope").is_none());
    }
}
