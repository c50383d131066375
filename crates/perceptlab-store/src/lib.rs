//! perceptlab-store — persistence collaborators.
//!
//! Implements the core's `SessionStore` trait for the REST persistence
//! service and for an in-memory store used by tests and offline runs.
//! All writes are best-effort from the experiment's point of view; retry
//! policy belongs to the service, never to this crate.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod wire;

pub use config::{load_config, StoreConfig};
pub use error::StoreError;
pub use http::HttpSessionStore;
pub use memory::MemorySessionStore;
