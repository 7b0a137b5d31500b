//! TCP chat server: acceptor, per-connection sessions, optional admin API.

mod error;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ServerError;
pub use handler::http::router;
pub use server::Server;
pub use signal::shutdown_signal;
pub use state::AppState;
