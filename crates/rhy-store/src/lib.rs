//! Persistent storage for the chart server.
//!
//! - [`Database`]: SQLite tables for users, songs, records and charts
//! - [`ObjectStore`]: binary objects (audio, chart text) addressed by key
//! - [`credentials`]: key issuing and hashing
//! - [`StorageService`]: the operations the HTTP routes expose

pub mod credentials;
mod database;
mod error;
mod object_store;
pub mod schema;
mod service;

pub use database::{Database, NewRecord, NewSong, SetUsername, UserRow};
pub use error::StoreError;
pub use object_store::{FsObjectStore, MemoryObjectStore, ObjectStore};
pub use service::{AudioUpload, StorageService, Verified};
