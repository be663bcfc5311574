//! Subscriptions module: user enrollment in experiments
//!
//! A subscription moves through `offered → started → completed | abandoned`
//! and records one completion per (task, day). At most one active
//! (`offered | started`) subscription exists per (user, experiment).

pub mod engine;
pub mod handler;
pub mod lifecycle;
pub mod migration;
pub mod responses;
pub mod store;
pub mod types;

pub use engine::SubscriptionEngine;
pub use handler::{subscriptions_router, SubscriptionsState};
pub use store::SubscriptionStore;
