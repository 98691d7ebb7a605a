//! Taskboard mock backend library.
//!
//! Exposes the in-memory REST server for use in tests and embedding. The
//! server keeps users and tasks in memory, stamps `updateDate` on every
//! create and update, and can touch the first task on every list request to
//! simulate another writer.

pub mod config;
pub mod server;
pub mod store;
