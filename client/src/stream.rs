use std::sync::Arc;

use amf::Value;
use rtmp_formats::{chunk::consts::csid, commands::consts::c2s_command_names};

use crate::{connection::Shared, errors::RtmpClientResult};

/// A logical stream allocated by `createStream`. Stream commands are fire
/// and forget (transaction id 0) on the stream command chunk stream,
/// addressed to this stream's message stream id.
pub struct Stream {
    shared: Arc<Shared>,
    id: u32,
}

impl Stream {
    pub(crate) fn new(shared: Arc<Shared>, id: u32) -> Self {
        Self { shared, id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub async fn play(&self, name: &str) -> RtmpClientResult<()> {
        self.send(c2s_command_names::RECEIVE_AUDIO, vec![Value::Null, Value::Boolean(true)])
            .await?;
        self.send(c2s_command_names::RECEIVE_VIDEO, vec![Value::Null, Value::Boolean(true)])
            .await?;
        self.send(
            c2s_command_names::PLAY,
            vec![Value::Null, Value::String(name.to_string())],
        )
        .await
    }

    pub async fn publish(&self, name: &str, mode: &str) -> RtmpClientResult<()> {
        self.send(
            c2s_command_names::PUBLISH,
            vec![
                Value::Null,
                Value::String(name.to_string()),
                Value::String(mode.to_string()),
            ],
        )
        .await
    }

    pub async fn pause(&self, paused: bool, milliseconds: f64) -> RtmpClientResult<()> {
        self.send(
            c2s_command_names::PAUSE,
            vec![
                Value::Null,
                Value::Boolean(paused),
                Value::Number(milliseconds),
            ],
        )
        .await
    }

    /// Sends an arbitrary stream command.
    pub async fn send(&self, name: &str, arguments: Vec<Value>) -> RtmpClientResult<()> {
        self.shared
            .notify(csid::NET_STREAM_COMMAND.into(), self.id, name, &arguments)
            .await
    }

    /// Calls a remote procedure addressed to this stream and waits for its
    /// reply.
    pub async fn call(
        &self,
        name: &str,
        arguments: Vec<Value>,
    ) -> RtmpClientResult<rtmp_formats::commands::CommandReply> {
        self.shared
            .call(csid::NET_STREAM_COMMAND.into(), self.id, name, &arguments)
            .await
    }

    /// Tells the server to stop and dispose of this stream.
    pub async fn close(&self) -> RtmpClientResult<()> {
        self.send(c2s_command_names::CLOSE_STREAM, vec![Value::Null])
            .await
    }

    pub async fn delete(&self) -> RtmpClientResult<()> {
        self.shared
            .notify(
                csid::NET_CONNECTION_COMMAND.into(),
                0,
                c2s_command_names::DELETE_STREAM,
                &[Value::Null, Value::Number(self.id as f64)],
            )
            .await
    }
}
