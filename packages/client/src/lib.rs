//! Terminal client for the Tertulia chat server.

pub mod domain;
pub mod error;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::{ClientOptions, run_client};
