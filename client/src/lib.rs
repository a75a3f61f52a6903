pub mod config;
pub mod connection;
pub mod errors;
pub mod events;
pub mod request;
pub mod stream;

pub use config::ClientConfig;
pub use connection::Connection;
pub use errors::RtmpClientError;
pub use events::{MediaKind, SessionEvent};
pub use stream::Stream;
