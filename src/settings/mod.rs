//! Settings module: per-user preferences
//!
//! The locale chosen here decides which language the today view and the
//! journal resolve bilingual names in.

pub mod handler;
pub mod store;
pub mod types;

pub use handler::{settings_router, SettingsState};
pub use store::SettingsStore;
