//! Identifier storage backends.
//!
//! The dispatch pipeline only needs [`IdentifierStore`](atrium_core::IdentifierStore)
//! lookups; durable backends live with the application that owns the data.
//! [`MemoryIdentifierStore`] serves development, tests and the test server.

pub mod memory;

pub use memory::MemoryIdentifierStore;
