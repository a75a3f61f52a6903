use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use utils::traits::{reader::ReadFrom, writer::WriteTo};

use super::{
    C0S0Packet, C1S1Packet, C2S2Packet, RTMP_VERSION, digest,
    consts::{
        RTMP_CLIENT_KEY, RTMP_CLIENT_KEY_FIRST_HALF, RTMP_HANDSHAKE_SIZE, RTMP_SERVER_KEY,
        RTMP_SERVER_KEY_FIRST_HALF,
    },
    errors::{HandshakeError, HandshakeResult},
};

/// Drives the client side of the three-way handshake. Once `handshake`
/// returns, the stream is byte-synchronized and carries chunks.
#[derive(Debug)]
pub struct HandshakeClient<S> {
    io: S,
    use_digest: bool,
}

impl<S> HandshakeClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: S) -> Self {
        Self {
            io,
            use_digest: false,
        }
    }

    /// Embeds an HMAC-SHA256 digest into C1 and checks S1 for one, for
    /// servers that negotiate the digest variant.
    pub fn with_digest(io: S) -> Self {
        Self {
            io,
            use_digest: true,
        }
    }

    pub fn into_inner(self) -> S {
        self.io
    }

    pub async fn handshake(&mut self) -> HandshakeResult<()> {
        let timestamp = utils::system::time::get_timestamp_ms().unwrap_or(0) as u32;

        let mut c1 = [0u8; RTMP_HANDSHAKE_SIZE];
        c1[..4].copy_from_slice(&timestamp.to_be_bytes());
        utils::random::random_fill(&mut c1[8..]);
        if self.use_digest {
            digest::imprint_digest(&mut c1, &RTMP_CLIENT_KEY[..RTMP_CLIENT_KEY_FIRST_HALF]);
        }

        let mut hello = Vec::with_capacity(1 + RTMP_HANDSHAKE_SIZE);
        C0S0Packet {
            version: RTMP_VERSION,
        }
        .write_to(&mut hello)?;
        hello.extend_from_slice(&c1);
        self.io.write_all(&hello).await?;
        self.io.flush().await?;

        let mut response = [0u8; 1 + 2 * RTMP_HANDSHAKE_SIZE];
        self.io.read_exact(&mut response).await?;

        let s0 = C0S0Packet::read_from(&mut &response[..1])?;
        if s0.version != RTMP_VERSION {
            return Err(HandshakeError::BadVersion(s0.version.into()));
        }

        let mut s1_block = [0u8; RTMP_HANDSHAKE_SIZE];
        s1_block.copy_from_slice(&response[1..1 + RTMP_HANDSHAKE_SIZE]);
        if self.use_digest
            && digest::validate_digest(&s1_block, &RTMP_SERVER_KEY[..RTMP_SERVER_KEY_FIRST_HALF])
                .is_err()
        {
            // plenty of servers answer a digest C1 with a plain S1
            debug!("no digest found in s1, continuing with the simple handshake");
        }
        let s1 = C1S1Packet::read_from(&mut &response[1..1 + RTMP_HANDSHAKE_SIZE])?;

        let s2 = C2S2Packet::read_from(&mut &response[1 + RTMP_HANDSHAKE_SIZE..])?;
        if s2.random_echo[..] != c1[8..] {
            debug!("s2 does not echo our c1 random block");
        }

        let c2 = C2S2Packet {
            timestamp: s1.timestamp,
            timestamp2: utils::system::time::get_timestamp_ms().unwrap_or(0) as u32,
            random_echo: s1.random_bytes,
        };
        let mut ack = Vec::with_capacity(RTMP_HANDSHAKE_SIZE);
        c2.write_to(&mut ack)?;
        self.io.write_all(&ack).await?;
        self.io.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HandshakeClient;
    use crate::handshake::{consts::RTMP_HANDSHAKE_SIZE, errors::HandshakeError};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn three_way_exchange() {
        let (client_io, mut server_io) = tokio::io::duplex(8192);

        let server = tokio::spawn(async move {
            let mut hello = [0u8; 1 + RTMP_HANDSHAKE_SIZE];
            server_io.read_exact(&mut hello).await.unwrap();
            assert_eq!(hello[0], 3);

            let mut response = vec![3u8];
            let mut s1 = [7u8; RTMP_HANDSHAKE_SIZE];
            s1[..8].fill(0);
            response.extend_from_slice(&s1);
            // s2 echoes c1
            response.extend_from_slice(&hello[1..9]);
            response.extend_from_slice(&hello[9..]);
            server_io.write_all(&response).await.unwrap();

            let mut c2 = [0u8; RTMP_HANDSHAKE_SIZE];
            server_io.read_exact(&mut c2).await.unwrap();
            // c2 echoes the s1 random block
            assert_eq!(c2[8..], s1[8..]);
        });

        let mut client = HandshakeClient::new(client_io);
        client.handshake().await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn rejects_unknown_version() {
        let (client_io, mut server_io) = tokio::io::duplex(8192);

        tokio::spawn(async move {
            let mut hello = [0u8; 1 + RTMP_HANDSHAKE_SIZE];
            server_io.read_exact(&mut hello).await.unwrap();
            let response = vec![6u8; 1 + 2 * RTMP_HANDSHAKE_SIZE];
            server_io.write_all(&response).await.unwrap();
        });

        let mut client = HandshakeClient::new(client_io);
        assert!(matches!(
            client.handshake().await,
            Err(HandshakeError::BadVersion(6))
        ));
    }

    #[tokio::test]
    async fn digest_variant_completes() {
        let (client_io, mut server_io) = tokio::io::duplex(8192);

        tokio::spawn(async move {
            let mut hello = [0u8; 1 + RTMP_HANDSHAKE_SIZE];
            server_io.read_exact(&mut hello).await.unwrap();
            let mut response = vec![3u8];
            response.extend_from_slice(&[9u8; RTMP_HANDSHAKE_SIZE]);
            response.extend_from_slice(&hello[1..]);
            server_io.write_all(&response).await.unwrap();
            let mut c2 = [0u8; RTMP_HANDSHAKE_SIZE];
            server_io.read_exact(&mut c2).await.unwrap();
        });

        let mut client = HandshakeClient::with_digest(client_io);
        client.handshake().await.unwrap();
    }
}
