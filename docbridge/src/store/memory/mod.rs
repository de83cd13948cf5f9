mod config;
mod event;
mod module;
mod query_exec;
mod store;

pub use config::*;
pub use module::*;
pub use store::*;
