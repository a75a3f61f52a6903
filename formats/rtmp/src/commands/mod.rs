use amf::{AmfObject, Field, Value};
use tokio_util::bytes::Bytes;

use crate::commands::errors::CommandMessageResult;

pub mod consts;
pub mod errors;
pub mod reader;
pub mod writer;

/// An outbound command: `(name, transaction id, arguments...)` on the AMF0
/// command plane. Transaction id 0 marks a fire-and-forget command that
/// expects no reply.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub procedure_name: String,
    pub transaction_id: f64,
    pub arguments: Vec<Value>,
}

/// An inbound command with its name and transaction id decoded and the
/// remaining arguments kept raw. `_error` payloads in particular are only
/// decoded when someone asks, typically to render the error text.
#[derive(Debug, Clone)]
pub struct CommandReply {
    pub command_name: String,
    pub transaction_id: f64,
    pub payload: Bytes,
}

impl CommandReply {
    pub fn is_error(&self) -> bool {
        self.command_name == consts::s2c_command_names::ERROR
    }

    pub fn is_result(&self) -> bool {
        self.command_name == consts::s2c_command_names::RESULT
    }

    /// Decodes the remaining arguments.
    pub fn values(&self) -> CommandMessageResult<Vec<Value>> {
        Ok(amf::Reader::new(&self.payload[..]).read_all()?)
    }
}

/// The `connect` command object.
/// @see: 7.2.1.1. connect
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectInfo {
    pub app: String,
    pub flash_version: String,
    pub capabilities: f64,
    pub audio_codecs: u16,
    pub video_codecs: u16,
    pub object_encoding: u8,
    pub swf_url: String,
    pub page_url: String,
    pub tc_url: String,
}

impl Default for ConnectInfo {
    fn default() -> Self {
        Self {
            app: String::new(),
            flash_version: "LNX 9,0,124,2".to_string(),
            capabilities: 239.0,
            audio_codecs: 3575,
            video_codecs: 252,
            object_encoding: 0,
            swf_url: String::new(),
            page_url: String::new(),
            tc_url: String::new(),
        }
    }
}

impl AmfObject for ConnectInfo {
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
                "flashVer",
                |v, w| Value::write_string(w, &v.flash_version),
                |v, r| {
                    v.flash_version = r.read_string()?;
                    Ok(())
                },
            ),
            Field::required(
                "capabilities",
                |v, w| Value::write_number(w, v.capabilities),
                |v, r| {
                    v.capabilities = r.read_f64()?;
                    Ok(())
                },
            ),
            Field::required(
                "audioCodecs",
                |v, w| Value::write_number(w, v.audio_codecs as f64),
                |v, r| {
                    v.audio_codecs = r.read_f64()? as u16;
                    Ok(())
                },
            ),
            Field::required(
                "videoCodecs",
                |v, w| Value::write_number(w, v.video_codecs as f64),
                |v, r| {
                    v.video_codecs = r.read_f64()? as u16;
                    Ok(())
                },
            ),
            Field::required(
                "objectEncoding",
                |v, w| Value::write_number(w, v.object_encoding as f64),
                |v, r| {
                    v.object_encoding = r.read_f64()? as u8;
                    Ok(())
                },
            ),
            Field::omit_empty(
                "swfUrl",
                |v, w| Value::write_string(w, &v.swf_url),
                |v, r| {
                    v.swf_url = r.read_string()?;
                    Ok(())
                },
                |v| v.swf_url.is_empty(),
            ),
            Field::omit_empty(
                "pageUrl",
                |v, w| Value::write_string(w, &v.page_url),
                |v, r| {
                    v.page_url = r.read_string()?;
                    Ok(())
                },
                |v| v.page_url.is_empty(),
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
