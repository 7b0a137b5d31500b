//! Infrastructure layer
//!
//! Concrete implementations of the domain collaborator traits.

pub mod codec;
pub mod dto;
pub mod message_pusher;
pub mod password;
pub mod repository;
