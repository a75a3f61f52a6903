use std::{sync::Arc, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpStream, ToSocketAddrs},
    sync::mpsc,
    time::timeout,
};
use tokio_util::bytes::BytesMut;
use tracing::{debug, error, trace, warn};

use amf::Value;
use rtmp_formats::{
    chunk::{self, ChunkMessage, Csid, consts::csid},
    commands::{
        self, CommandReply, ConnectInfo,
        consts::c2s_command_names,
        errors::CommandMessageError,
    },
    handshake::client::HandshakeClient,
    message::{ChunkMessageType, RtmpMessageType},
    protocol_control::ProtocolControlMessage,
    user_control::UserControlEvent,
};
use utils::traits::reader::{ReadFrom, ReadRemainingFrom};

use crate::{
    config::ClientConfig,
    errors::{RtmpClientError, RtmpClientResult},
    events::{MediaKind, SessionEvent},
    request::{RemoteCallError, RequestMux},
    stream::Stream,
};

struct Outbound {
    chunk_writer: chunk::writer::Writer,
    io: Box<dyn AsyncWrite + Send + Unpin>,
}

impl Outbound {
    async fn flush(&mut self) -> RtmpClientResult<()> {
        self.chunk_writer.flush_to(&mut self.io).await?;
        Ok(())
    }
}

/// State shared between the connection handle, its streams, and the reader
/// task. The outbound mutex is held across compose-and-flush of a whole
/// message, so chunk runs of different messages never interleave on one
/// chunk stream.
pub(crate) struct Shared {
    outbound: tokio::sync::Mutex<Outbound>,
    requests: RequestMux,
    config: ClientConfig,
}

impl Shared {
    pub(crate) async fn send_command_payload(
        &self,
        chunk_stream_id: Csid,
        stream_id: u32,
        payload: &[u8],
    ) -> RtmpClientResult<()> {
        let mut outbound = self.outbound.lock().await;
        outbound.chunk_writer.write_message(
            chunk_stream_id,
            0,
            RtmpMessageType::AMF0Command.into(),
            stream_id,
            payload,
        )?;
        outbound.flush().await
    }

    /// Sends a command that expects a reply and blocks until it arrives or
    /// the request deadline elapses.
    pub(crate) async fn call(
        &self,
        chunk_stream_id: Csid,
        stream_id: u32,
        name: &str,
        arguments: &[Value],
    ) -> RtmpClientResult<CommandReply> {
        let (id, rx) = self.requests.register();
        let payload = match encode_command(name, id as f64, arguments) {
            Ok(payload) => payload,
            Err(err) => {
                self.requests.remove(id);
                return Err(err.into());
            }
        };
        if let Err(err) = self
            .send_command_payload(chunk_stream_id, stream_id, &payload)
            .await
        {
            self.requests.remove(id);
            return Err(err);
        }
        self.await_reply(id, rx).await
    }

    pub(crate) async fn await_reply(
        &self,
        id: u64,
        rx: tokio::sync::oneshot::Receiver<CommandReply>,
    ) -> RtmpClientResult<CommandReply> {
        let deadline = Duration::from_millis(self.config.request_timeout_ms);
        match timeout(deadline, rx).await {
            Ok(Ok(reply)) => {
                if reply.is_error() {
                    Err(RemoteCallError::new(reply).into())
                } else {
                    Ok(reply)
                }
            }
            Ok(Err(_)) => Err(RtmpClientError::ConnectionClosed),
            Err(_) => {
                // remove the waiter so a late reply is dropped, not leaked
                self.requests.remove(id);
                Err(RtmpClientError::RequestTimeout)
            }
        }
    }

    /// Fire and forget: transaction id 0, no waiter.
    pub(crate) async fn notify(
        &self,
        chunk_stream_id: Csid,
        stream_id: u32,
        name: &str,
        arguments: &[Value],
    ) -> RtmpClientResult<()> {
        let payload = encode_command(name, 0.0, arguments).map_err(RtmpClientError::from)?;
        self.send_command_payload(chunk_stream_id, stream_id, &payload)
            .await
    }
}

fn encode_command(
    name: &str,
    transaction_id: f64,
    arguments: &[Value],
) -> Result<Vec<u8>, CommandMessageError> {
    let mut payload = Vec::new();
    let mut writer = commands::writer::Writer::new(&mut payload);
    writer.write_header(name, transaction_id)?;
    for argument in arguments {
        writer.write_value(argument)?;
    }
    Ok(payload)
}

/// An RTMP client connection.
///
/// One dedicated reader task owns the inbound byte stream; any number of
/// tasks may send commands concurrently. Events the peer pushes outside of
/// request/reply correlation arrive on the channel returned by
/// [`Connection::connect`] / [`Connection::with_stream`].
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        config: ClientConfig,
    ) -> RtmpClientResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Self::with_stream(stream, config).await
    }

    /// Builds a connection over an already-established transport: runs the
    /// handshake, announces our window-ack size and chunk size, and spawns
    /// the reader task.
    pub async fn with_stream<S>(
        io: S,
        config: ClientConfig,
    ) -> RtmpClientResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let mut handshake = HandshakeClient::new(io);
        handshake.handshake().await?;
        let io = handshake.into_inner();
        let (read_half, write_half) = tokio::io::split(io);

        let mut chunk_writer = chunk::writer::Writer::new();
        chunk_writer.write_window_ack_size(config.window_ack_size)?;
        chunk_writer.set_chunk_size(config.chunk_size)?;

        let shared = Arc::new(Shared {
            outbound: tokio::sync::Mutex::new(Outbound {
                chunk_writer,
                io: Box::new(write_half),
            }),
            requests: RequestMux::new(),
            config,
        });
        shared.outbound.lock().await.flush().await?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let task = ReaderTask {
            shared: shared.clone(),
            io: Box::new(read_half),
            chunk_reader: chunk::reader::Reader::new(),
            buf: BytesMut::with_capacity(4096),
            ack_window: None,
            peer_bandwidth: None,
            events: events_tx,
        };
        tokio::spawn(task.run());

        Ok((Self { shared }, events_rx))
    }

    /// Issues the `connect` command with the given command object.
    pub async fn connect_app(&self, info: &ConnectInfo) -> RtmpClientResult<CommandReply> {
        let (id, rx) = self.shared.requests.register();
        let payload = (|| {
            let mut payload = Vec::new();
            let mut writer = commands::writer::Writer::new(&mut payload);
            writer.write_header(c2s_command_names::CONNECT, id as f64)?;
            writer.write_object(info)?;
            Ok::<_, CommandMessageError>(payload)
        })();
        let payload = match payload {
            Ok(payload) => payload,
            Err(err) => {
                self.shared.requests.remove(id);
                return Err(err.into());
            }
        };
        if let Err(err) = self
            .shared
            .send_command_payload(csid::NET_CONNECTION_COMMAND.into(), 0, &payload)
            .await
        {
            self.shared.requests.remove(id);
            return Err(err);
        }
        self.shared.await_reply(id, rx).await
    }

    /// Calls a remote procedure on the connection and waits for its reply.
    pub async fn call(&self, name: &str, arguments: Vec<Value>) -> RtmpClientResult<CommandReply> {
        self.shared
            .call(csid::NET_CONNECTION_COMMAND.into(), 0, name, &arguments)
            .await
    }

    /// Sends a command that expects no reply.
    pub async fn notify(&self, name: &str, arguments: Vec<Value>) -> RtmpClientResult<()> {
        self.shared
            .notify(csid::NET_CONNECTION_COMMAND.into(), 0, name, &arguments)
            .await
    }

    /// Allocates a logical stream via `createStream`.
    pub async fn create_stream(&self) -> RtmpClientResult<Stream> {
        let reply = self
            .call(c2s_command_names::CREATE_STREAM, vec![Value::Null])
            .await?;
        let stream_id = reply
            .values()?
            .iter()
            .find_map(Value::try_as_f64)
            .ok_or_else(|| {
                RtmpClientError::ProtocolViolation(
                    "createStream reply carries no stream id".to_string(),
                )
            })?;
        Ok(Stream::new(self.shared.clone(), stream_id as u32))
    }

    /// Shuts down the outbound side of the transport.
    pub async fn close(&self) -> RtmpClientResult<()> {
        let mut outbound = self.shared.outbound.lock().await;
        outbound.flush().await?;
        outbound.io.shutdown().await?;
        Ok(())
    }
}

/// The dedicated reader task: owns the read half, the inbound buffer, and
/// the chunk reader; everything past the socket read is non-blocking.
struct ReaderTask {
    shared: Arc<Shared>,
    io: Box<dyn AsyncRead + Send + Unpin>,
    chunk_reader: chunk::reader::Reader,
    buf: BytesMut,
    ack_window: Option<u32>,
    peer_bandwidth: Option<u32>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ReaderTask {
    async fn run(mut self) {
        match self.drive().await {
            Ok(()) => debug!("connection closed by peer"),
            Err(err) => error!("reader task failed: {}", err),
        }
        self.shared.requests.fail_all();
    }

    async fn drive(&mut self) -> RtmpClientResult<()> {
        let read_timeout = Duration::from_millis(self.shared.config.read_timeout_ms);
        loop {
            while let Some(message) = self.chunk_reader.read_message(&mut self.buf)? {
                self.dispatch(message).await?;
                self.maybe_acknowledge().await?;
            }
            let read = match timeout(read_timeout, self.io.read_buf(&mut self.buf)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(RtmpClientError::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "socket read timed out",
                    )));
                }
            };
            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(());
                }
                return Err(RtmpClientError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset mid-message",
                )));
            }
        }
    }

    async fn dispatch(&mut self, message: ChunkMessage) -> RtmpClientResult<()> {
        let header = message.header;
        let payload = message.payload;
        match ChunkMessageType::try_from(header.message_type_id)? {
            ChunkMessageType::ProtocolControl(message_type) => {
                let control =
                    ProtocolControlMessage::read_remaining_from(message_type, &mut &payload[..])?;
                self.handle_protocol_control(control).await?;
            }
            ChunkMessageType::RtmpUserMessage(message_type) => match message_type {
                RtmpMessageType::UserControl => {
                    let event = UserControlEvent::read_from(&mut &payload[..])?;
                    self.handle_user_control(event).await?;
                }
                RtmpMessageType::AMF0Command | RtmpMessageType::AMF3Command => {
                    self.handle_command(message_type, header.message_stream_id, &payload);
                }
                RtmpMessageType::Audio => {
                    self.emit_media(&header, MediaKind::Audio, payload);
                }
                RtmpMessageType::Video => {
                    self.emit_media(&header, MediaKind::Video, payload);
                }
                RtmpMessageType::AMF0Data | RtmpMessageType::AMF3Data => {
                    self.emit_media(&header, MediaKind::Data, payload);
                }
                RtmpMessageType::AMF0SharedObject | RtmpMessageType::AMF3SharedObject => {
                    self.emit_media(&header, MediaKind::SharedObject, payload);
                }
                RtmpMessageType::Aggregate => {
                    self.emit_media(&header, MediaKind::Aggregate, payload);
                }
            },
        }
        Ok(())
    }

    async fn handle_protocol_control(
        &mut self,
        control: ProtocolControlMessage,
    ) -> RtmpClientResult<()> {
        match control {
            ProtocolControlMessage::SetChunkSize(m) => {
                debug!("peer set the inbound chunk size to {}", m.chunk_size);
                self.chunk_reader.set_chunk_size(m.chunk_size as usize);
            }
            ProtocolControlMessage::Abort(m) => {
                self.chunk_reader.abort(m.chunk_stream_id);
            }
            ProtocolControlMessage::Ack(m) => {
                trace!("peer acknowledged {} bytes", m.sequence_number);
            }
            ProtocolControlMessage::WindowAckSize(m) => {
                self.ack_window = Some(m.size);
            }
            ProtocolControlMessage::SetPeerBandwidth(m) => {
                let changed = self.peer_bandwidth != Some(m.size);
                self.peer_bandwidth = Some(m.size);
                if changed {
                    debug!("peer bandwidth limit {} ({:?})", m.size, m.limit_type);
                    let mut outbound = self.shared.outbound.lock().await;
                    outbound
                        .chunk_writer
                        .write_window_ack_size(self.shared.config.window_ack_size)?;
                    outbound.flush().await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_user_control(&mut self, event: UserControlEvent) -> RtmpClientResult<()> {
        match event {
            UserControlEvent::PingRequest { timestamp } => {
                let mut outbound = self.shared.outbound.lock().await;
                outbound
                    .chunk_writer
                    .write_user_control(&UserControlEvent::PingResponse { timestamp })?;
                outbound.flush().await?;
            }
            UserControlEvent::PingResponse { timestamp } => {
                let _ = self.events.send(SessionEvent::PingResponse { timestamp });
            }
            UserControlEvent::StreamBegin { stream_id } => {
                let _ = self.events.send(SessionEvent::StreamBegin { stream_id });
            }
            UserControlEvent::StreamEOF { stream_id } => {
                let _ = self.events.send(SessionEvent::StreamEof { stream_id });
            }
            UserControlEvent::StreamDry { stream_id } => {
                let _ = self.events.send(SessionEvent::StreamDry { stream_id });
            }
            UserControlEvent::StreamIdsRecorded { stream_id } => {
                let _ = self
                    .events
                    .send(SessionEvent::StreamIsRecorded { stream_id });
            }
            UserControlEvent::SetBufferLength {
                stream_id,
                buffer_length,
            } => {
                trace!(
                    "peer set buffer length {} ms on stream {}",
                    buffer_length, stream_id
                );
            }
        }
        Ok(())
    }

    /// A malformed command only poisons itself: the chunk layer already
    /// found the message boundary, so the stream stays synchronized.
    fn handle_command(&mut self, message_type: RtmpMessageType, stream_id: u32, payload: &[u8]) {
        let reply = match commands::reader::Reader::new(payload)
            .read_reply(message_type.amf_version())
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!("dropping malformed command: {}", err);
                return;
            }
        };
        if reply.is_result() || reply.is_error() {
            self.shared.requests.deliver(reply);
            return;
        }
        match reply.values() {
            Ok(arguments) => {
                let _ = self.events.send(SessionEvent::Command {
                    name: reply.command_name,
                    transaction_id: reply.transaction_id,
                    arguments,
                    stream_id,
                });
            }
            Err(err) => warn!(
                "dropping {} command with undecodable arguments: {}",
                reply.command_name, err
            ),
        }
    }

    fn emit_media(
        &mut self,
        header: &rtmp_formats::chunk::ChunkMessageCommonHeader,
        kind: MediaKind,
        payload: BytesMut,
    ) {
        let _ = self.events.send(SessionEvent::Media {
            stream_id: header.message_stream_id,
            timestamp: header.timestamp,
            kind,
            payload: payload.freeze(),
        });
    }

    /// Emits exactly one ack each time the received-byte counter crosses
    /// the peer-announced window.
    async fn maybe_acknowledge(&mut self) -> RtmpClientResult<()> {
        let Some(window) = self.ack_window else {
            return Ok(());
        };
        if self.chunk_reader.bytes_received() < window {
            return Ok(());
        }
        let sequence_number = self.chunk_reader.sequence_number();
        let mut outbound = self.shared.outbound.lock().await;
        outbound.chunk_writer.write_acknowledgement(sequence_number)?;
        outbound.flush().await?;
        drop(outbound);
        self.chunk_reader.reset_bytes_received();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Connection;
    use crate::{
        config::ClientConfig,
        errors::RtmpClientError,
        events::{MediaKind, SessionEvent},
    };
    use amf::Value;
    use rtmp_formats::{
        chunk::{self, ChunkMessage},
        commands::{self, ConnectInfo},
        handshake::consts::RTMP_HANDSHAKE_SIZE,
        user_control::UserControlEvent,
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        sync::mpsc,
    };
    use tokio_util::bytes::BytesMut;
    use utils::traits::{reader::ReadFrom, writer::WriteTo};

    /// The other end of the wire, scripted from the same format components
    /// the client is built on.
    struct TestPeer {
        io: tokio::io::DuplexStream,
        reader: chunk::reader::Reader,
        writer: chunk::writer::Writer,
        buf: BytesMut,
    }

    impl TestPeer {
        fn new(io: tokio::io::DuplexStream) -> Self {
            Self {
                io,
                reader: chunk::reader::Reader::new(),
                writer: chunk::writer::Writer::new(),
                buf: BytesMut::new(),
            }
        }

        async fn handshake(&mut self) {
            let mut hello = [0u8; 1 + RTMP_HANDSHAKE_SIZE];
            self.io.read_exact(&mut hello).await.unwrap();
            assert_eq!(hello[0], 3);
            let mut response = vec![3u8];
            let mut s1 = [5u8; RTMP_HANDSHAKE_SIZE];
            s1[..8].fill(0);
            response.extend_from_slice(&s1);
            response.extend_from_slice(&hello[1..]);
            self.io.write_all(&response).await.unwrap();
            let mut c2 = [0u8; RTMP_HANDSHAKE_SIZE];
            self.io.read_exact(&mut c2).await.unwrap();
        }

        /// Next complete message, transparently applying set-chunk-size.
        async fn next_message(&mut self) -> ChunkMessage {
            loop {
                if let Some(message) = self.reader.read_message(&mut self.buf).unwrap() {
                    if message.header.message_type_id == 0x01 {
                        let size =
                            u32::from_be_bytes(message.payload[..4].try_into().unwrap());
                        self.reader.set_chunk_size(size as usize);
                        continue;
                    }
                    return message;
                }
                assert_ne!(
                    self.io.read_buf(&mut self.buf).await.unwrap(),
                    0,
                    "peer hit eof"
                );
            }
        }

        /// Next inbound command as (name, transaction id, arguments).
        async fn next_command(&mut self) -> (String, f64, Vec<Value>) {
            loop {
                let message = self.next_message().await;
                if message.header.message_type_id != 0x14 {
                    continue;
                }
                let reply = commands::reader::Reader::new(&message.payload[..])
                    .read_reply(amf::Version::Amf0)
                    .unwrap();
                return (
                    reply.command_name.clone(),
                    reply.transaction_id,
                    reply.values().unwrap(),
                );
            }
        }

        async fn send_message(
            &mut self,
            csid: u32,
            timestamp: u32,
            type_id: u8,
            stream_id: u32,
            payload: &[u8],
        ) {
            self.writer
                .write_message(csid, timestamp, type_id, stream_id, payload)
                .unwrap();
            self.writer.flush_to(&mut self.io).await.unwrap();
        }

        async fn send_command(&mut self, name: &str, transaction_id: f64, arguments: &[Value]) {
            let mut payload = Vec::new();
            let mut writer = commands::writer::Writer::new(&mut payload);
            writer.write_header(name, transaction_id).unwrap();
            for argument in arguments {
                writer.write_value(argument).unwrap();
            }
            self.send_message(3, 0, 0x14, 0, &payload).await;
        }

        async fn send_user_control(&mut self, event: &UserControlEvent) {
            let mut payload = Vec::new();
            event.write_to(&mut payload).unwrap();
            self.send_message(2, 0, 0x04, 0, &payload).await;
        }
    }

    async fn setup(
        config: ClientConfig,
    ) -> (
        Connection,
        mpsc::UnboundedReceiver<SessionEvent>,
        TestPeer,
    ) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let mut peer = TestPeer::new(server_io);
        let (connection, ()) =
            tokio::join!(Connection::with_stream(client_io, config), peer.handshake());
        let (connection, events) = connection.unwrap();
        (connection, events, peer)
    }

    #[tokio::test]
    async fn connect_create_stream_play() {
        let (connection, _events, mut peer) = setup(ClientConfig::default()).await;

        let client = tokio::spawn(async move {
            let info = ConnectInfo {
                app: "live".to_string(),
                tc_url: "rtmp://localhost/live".to_string(),
                ..Default::default()
            };
            connection.connect_app(&info).await.unwrap();
            let stream = connection.create_stream().await.unwrap();
            assert_eq!(stream.id(), 1);
            stream.play("cam0").await.unwrap();
        });

        let (name, transaction_id, arguments) = peer.next_command().await;
        assert_eq!(name, "connect");
        assert_eq!(transaction_id, 1.0);
        let entries = arguments
            .into_iter()
            .next()
            .unwrap()
            .try_into_pairs()
            .unwrap();
        assert!(entries.contains(&("app".to_string(), Value::String("live".to_string()))));
        peer.send_command("_result", 1.0, &[Value::Null, Value::Null])
            .await;

        let (name, transaction_id, arguments) = peer.next_command().await;
        assert_eq!(name, "createStream");
        assert_eq!(transaction_id, 2.0);
        assert_eq!(arguments, vec![Value::Null]);
        peer.send_command("_result", 2.0, &[Value::Null, Value::Number(1.0)])
            .await;

        let (name, transaction_id, arguments) = peer.next_command().await;
        assert_eq!((name.as_str(), transaction_id), ("receiveAudio", 0.0));
        assert_eq!(arguments, vec![Value::Null, Value::Boolean(true)]);
        let (name, ..) = peer.next_command().await;
        assert_eq!(name, "receiveVideo");
        let (name, _, arguments) = peer.next_command().await;
        assert_eq!(name, "play");
        assert_eq!(
            arguments,
            vec![Value::Null, Value::String("cam0".to_string())]
        );

        client.await.unwrap();
    }

    #[tokio::test]
    async fn call_times_out_without_a_reply() {
        let config = ClientConfig {
            request_timeout_ms: 50,
            ..Default::default()
        };
        let (connection, _events, mut peer) = setup(config).await;

        let client = tokio::spawn(async move {
            connection.call("createStream", vec![Value::Null]).await
        });
        let (name, ..) = peer.next_command().await;
        assert_eq!(name, "createStream");
        // never reply
        assert!(matches!(
            client.await.unwrap(),
            Err(RtmpClientError::RequestTimeout)
        ));
    }

    #[tokio::test]
    async fn error_replies_render_their_arguments_lazily() {
        let (connection, _events, mut peer) = setup(ClientConfig::default()).await;

        let client =
            tokio::spawn(async move { connection.call("publish", vec![Value::Null]).await });
        let (_, transaction_id, _) = peer.next_command().await;
        peer.send_command(
            "_error",
            transaction_id,
            &[
                Value::Null,
                Value::Object {
                    class_name: None,
                    entries: vec![(
                        "code".to_string(),
                        Value::String("NetConnection.Call.Failed".to_string()),
                    )],
                },
            ],
        )
        .await;

        let err = client.await.unwrap().unwrap_err();
        let text = format!("{}", err);
        assert!(
            text.contains("NetConnection.Call.Failed"),
            "unexpected error text: {}",
            text
        );
    }

    #[tokio::test]
    async fn ping_requests_are_answered_with_the_same_timestamp() {
        let (_connection, _events, mut peer) = setup(ClientConfig::default()).await;

        peer.send_user_control(&UserControlEvent::PingRequest { timestamp: 99 })
            .await;
        loop {
            let message = peer.next_message().await;
            if message.header.message_type_id != 0x04 {
                continue;
            }
            let event = UserControlEvent::read_from(&mut &message.payload[..]).unwrap();
            assert_eq!(event, UserControlEvent::PingResponse { timestamp: 99 });
            break;
        }
    }

    #[tokio::test]
    async fn midstream_chunk_size_change_applies_to_reassembly() {
        let (_connection, mut events, mut peer) = setup(ClientConfig::default()).await;

        let payload: Vec<u8> = (0..200u32).map(|i| i as u8).collect();
        peer.writer.set_chunk_size(64).unwrap();
        peer.writer
            .write_message(6, 40, 0x09, 1, &payload)
            .unwrap();
        peer.writer.flush_to(&mut peer.io).await.unwrap();

        match events.recv().await.unwrap() {
            SessionEvent::Media {
                stream_id,
                timestamp,
                kind,
                payload: received,
            } => {
                assert_eq!(stream_id, 1);
                assert_eq!(timestamp, 40);
                assert_eq!(kind, MediaKind::Video);
                assert_eq!(&received[..], &payload[..]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn acknowledgements_follow_the_peer_window() {
        let (_connection, mut events, mut peer) = setup(ClientConfig::default()).await;

        let mut window = Vec::new();
        rtmp_formats::protocol_control::ProtocolControlMessage::WindowAckSize(
            rtmp_formats::protocol_control::WindowAckSize { size: 500 },
        )
        .write_to(&mut window)
        .unwrap();
        peer.send_message(2, 0, 0x05, 0, &window).await;

        let media = vec![0x77u8; 600];
        peer.send_message(7, 0, 0x08, 1, &media).await;

        loop {
            let message = peer.next_message().await;
            if message.header.message_type_id == 0x03 {
                let sequence =
                    u32::from_be_bytes(message.payload[..4].try_into().unwrap());
                assert!(sequence >= 600, "ack sequence too small: {}", sequence);
                break;
            }
        }
        // the media still surfaced
        match events.recv().await.unwrap() {
            SessionEvent::Media { kind, payload, .. } => {
                assert_eq!(kind, MediaKind::Audio);
                assert_eq!(payload.len(), 600);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_commands_surface_as_events() {
        let (_connection, mut events, mut peer) = setup(ClientConfig::default()).await;

        peer.send_command(
            "onStatus",
            0.0,
            &[
                Value::Null,
                Value::Object {
                    class_name: None,
                    entries: vec![(
                        "code".to_string(),
                        Value::String("NetStream.Play.Start".to_string()),
                    )],
                },
            ],
        )
        .await;

        match events.recv().await.unwrap() {
            SessionEvent::Command {
                name,
                transaction_id,
                arguments,
                ..
            } => {
                assert_eq!(name, "onStatus");
                assert_eq!(transaction_id, 0.0);
                assert_eq!(arguments.len(), 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
