//! Persistence module
//!
//! Tasks live in memory for the lifetime of the process.

mod task_store;

pub use task_store::InMemoryTaskStore;
