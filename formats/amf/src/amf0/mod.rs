pub mod mapping;
pub mod reader;
pub mod writer;

pub use reader::Reader;

/// AMF0 type markers.
/// @see: AMF0 specification, 2.1 Types Overview
pub mod amf0_marker {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const MOVIECLIP: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
    pub const UNSUPPORTED: u8 = 0x0D;
    pub const RECORDSET: u8 = 0x0E;
    pub const XML_DOCUMENT: u8 = 0x0F;
    pub const TYPED_OBJECT: u8 = 0x10;
}

/// A self-describing AMF0 value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// All AMF0 numbers travel as IEEE-754 doubles, integers included.
    Number(f64),
    Boolean(bool),
    String(String),
    Object {
        class_name: Option<String>,
        entries: Vec<(String, Value)>,
    },
    Null,
    Undefined,
    Reference {
        index: u16,
    },
    ECMAArray(Vec<(String, Value)>),
    /// Terminator sentinel, only ever seen while walking object entries.
    ObjectEnd,
    StrictArray(Vec<Value>),
    /// Milliseconds since the unix epoch; the legacy timezone field is
    /// always written as zero and ignored on read.
    Date {
        millis: f64,
    },
    XMLDocument(String),
}

impl Value {
    pub fn try_as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref s) => Some(s.as_str()),
            Value::XMLDocument(ref s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn try_as_f64(&self) -> Option<f64> {
        match *self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn try_as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn try_into_pairs(self) -> Result<Vec<(String, Value)>, Self> {
        match self {
            Value::Object { entries, .. } => Ok(entries),
            Value::ECMAArray(entries) => Ok(entries),
            other => Err(other),
        }
    }
}
