//! Tertulia chat broker.
//!
//! A concurrent TCP chat server: clients authenticate with a one-line
//! handshake, then chat in a global lobby or in rooms they create and join.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

pub use config::{ServerConfig, SessionSettings};
