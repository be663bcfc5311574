//! Journal module: free-text answers, newest first
//!
//! Entries are written by the subscription engine whenever a task
//! submission answers a `text` block, and read back through a projection
//! that resolves experiment, task and block names in the caller's locale.

pub mod handler;
pub mod projection;
pub mod store;
pub mod types;

pub use handler::{journal_router, JournalState};
pub use store::JournalStore;
