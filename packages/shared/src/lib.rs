//! Utilities shared by the Tertulia server and client binaries.

pub mod logger;
pub mod time;
