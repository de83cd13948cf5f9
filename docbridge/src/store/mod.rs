//! Store backends and the contract they satisfy.
//!
//! The client never talks to a database directly. It goes through a
//! [DocumentStore] handle wrapping a [DocumentStoreProvider], which any concrete
//! backend implements:
//!
//! - addressable collections keyed by endpoint, documents keyed by id
//! - point reads, full and constrained collection reads
//! - overwrite, merge, batch and delete writes
//! - document and query watches that push [WatchEvent]s until released
//!
//! docbridge ships [memory::MemoryStore], an in-process backend that stands in
//! for an emulator instance and is what the test suites run against.

mod document_store;
pub mod memory;
mod store_config;
mod store_module;
mod watch;

pub use document_store::*;
pub use store_config::*;
pub use store_module::*;
pub use watch::*;
