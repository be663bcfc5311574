//! Progress module: the today view
//!
//! A read-only projection over started subscriptions and content.

pub mod handler;
pub mod projection;
pub mod types;

pub use handler::{progress_router, ProgressState};
