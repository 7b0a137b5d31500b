//! UseCase layer
//!
//! - `auth`: Auth Gateway
//! - `room_directory`: Room Directory
//! - `broadcast`: Broadcast Engine
//! - `state`: the shared broker state the three operate on

pub mod auth;
pub mod broadcast;
pub mod error;
pub mod room_directory;
pub mod state;

pub use auth::AuthGateway;
pub use broadcast::{BroadcastEngine, DeliveryReport, DepartureReason};
pub use error::{AuthError, RoomDirectoryError};
pub use room_directory::{DeletedRoom, EnteredRoom, LeftRoom, RoomDirectory, RoomOverview};
pub use state::{BrokerState, Departure, SharedState};
