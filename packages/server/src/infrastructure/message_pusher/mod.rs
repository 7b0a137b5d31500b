//! Outbound delivery implementations
//!
//! - `channel`: per-connection mpsc queues drained by the session writer task

pub mod channel;

pub use channel::ChannelMessagePusher;
