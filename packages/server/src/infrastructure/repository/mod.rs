//! Persistence store implementations
//!
//! - `inmemory`: process-lifetime store
//! - `json_file`: the same data, snapshotted to a JSON file after every mutation
//!
//! Both implement `UserRepository` and `RoomRepository` on top of `StoreData`.

mod data;
pub mod inmemory;
pub mod json_file;

pub use data::StoreData;
pub use inmemory::InMemoryStore;
pub use json_file::JsonFileStore;
