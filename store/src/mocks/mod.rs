//! Test doubles.
//!
//! In-memory implementations of the store's collaborators for use in unit and
//! integration tests.

pub mod memory;

pub use memory::MemoryCache;
