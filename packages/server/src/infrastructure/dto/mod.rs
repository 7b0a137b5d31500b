//! Data Transfer Objects.
//!
//! - `persistence`: rows of the JSON store snapshot
//! - `http`: admin API response bodies
//! - `conversion`: DTO <-> domain entity conversions

pub mod conversion;
pub mod http;
pub mod persistence;
