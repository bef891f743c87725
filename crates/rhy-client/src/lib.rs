//! Client side of the chart storage API.
//!
//! [`StorageClient`] is what the recorder talks to; [`HttpStorageClient`]
//! implements it over HTTP with reqwest.

mod connection;
mod error;
mod http;

pub use connection::{AudioFile, StorageClient, Verification};
pub use error::ClientError;
pub use http::HttpStorageClient;
