//! Execution port implementations.
//!
//! - [`HttpPort`]: the database's HTTP `_find` / `_index` endpoints
//! - [`MemoryPort`]: local evaluation over in-memory documents, for tests

mod http;
mod memory;

pub use http::HttpPort;
pub use memory::MemoryPort;
