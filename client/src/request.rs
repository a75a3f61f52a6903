use std::{
    collections::HashMap,
    fmt,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::oneshot;
use tracing::debug;

use rtmp_formats::commands::CommandReply;

/// Correlates outbound commands with their `_result`/`_error` replies by
/// transaction id.
///
/// Ids are positive and monotonically increasing; id 0 marks
/// fire-and-forget commands and never correlates. A waiter lives from
/// `register` until its reply is delivered, the request deadline removes
/// it, or the connection dies and `fail_all` drops every sender.
#[derive(Debug)]
pub struct RequestMux {
    next_transaction_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<CommandReply>>>,
}

impl RequestMux {
    pub fn new() -> Self {
        Self {
            next_transaction_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Allocates a fresh transaction id and records a waiter for it.
    pub fn register(&self) -> (u64, oneshot::Receiver<CommandReply>) {
        let id = self.next_transaction_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending table lock poisoned")
            .insert(id, tx);
        (id, rx)
    }

    pub fn remove(&self, id: u64) -> Option<oneshot::Sender<CommandReply>> {
        self.pending
            .lock()
            .expect("pending table lock poisoned")
            .remove(&id)
    }

    /// Routes an inbound reply to its waiter. Replies for id 0, unknown
    /// ids, or ids whose deadline already fired are dropped.
    pub fn deliver(&self, reply: CommandReply) {
        let id = reply.transaction_id as u64;
        if id == 0 {
            debug!("dropping {} reply with transaction id 0", reply.command_name);
            return;
        }
        match self.remove(id) {
            Some(waiter) => {
                if waiter.send(reply).is_err() {
                    debug!("waiter for transaction {} is gone", id);
                }
            }
            None => debug!("no pending request for transaction {}", id),
        }
    }

    /// Drops every waiter; their `call`s observe a closed connection.
    pub fn fail_all(&self) {
        self.pending
            .lock()
            .expect("pending table lock poisoned")
            .clear();
    }
}

/// An `_error` reply. The argument list is only decoded when the error is
/// rendered.
#[derive(Debug)]
pub struct RemoteCallError {
    reply: CommandReply,
}

impl RemoteCallError {
    pub fn new(reply: CommandReply) -> Self {
        Self { reply }
    }

    pub fn reply(&self) -> &CommandReply {
        &self.reply
    }
}

impl fmt::Display for RemoteCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reply.values() {
            Ok(arguments) => write!(f, "rtmp: error response {:?}", arguments),
            Err(_) => write!(
                f,
                "rtmp: error response with {} undecodable bytes",
                self.reply.payload.len()
            ),
        }
    }
}

impl std::error::Error for RemoteCallError {}
