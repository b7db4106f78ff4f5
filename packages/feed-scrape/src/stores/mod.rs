//! Storage implementations for the cache layer.
//!
//! - [`MemoryCacheStore`] - In-memory, process-lifetime storage

mod memory;

pub use memory::MemoryCacheStore;
