#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClientConfig {
    /// Outbound chunk payload size, announced right after the handshake.
    pub chunk_size: u32,
    /// Our window acknowledgement size, announced to the peer.
    pub window_ack_size: u32,
    /// Deadline for every command that expects a reply.
    pub request_timeout_ms: u64,
    /// Socket read timeout for the reader task.
    pub read_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            window_ack_size: 2_500_000,
            request_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
        }
    }
}
