//! Content module: boxes, experiments, tasks and static documents
//!
//! Admins author content through the editor endpoints; everyone else reads
//! published content. Entities are persisted as JSON files under
//! `<base>/content/`.

pub mod handler;
pub mod store;
pub mod types;
pub mod validate;

pub use handler::{content_router, ContentState};
pub use store::ContentStore;
