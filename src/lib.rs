//! Habitlab - backend for a bilingual habit-experiment tracker
//!
//! Users subscribe to multi-day behavioral experiments grouped into themed
//! boxes, complete daily tasks made of content blocks, and journal their
//! answers. Administrators author and publish the content.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 axum Router (api::build_app)                 │
//! │   CORS → TraceLayer → identity middleware → module routers   │
//! └───────┬──────────────┬───────────────┬──────────────┬────────┘
//!         │              │               │              │
//!   ┌─────▼─────┐ ┌──────▼───────┐ ┌─────▼─────┐ ┌──────▼─────┐
//!   │  content  │ │subscriptions │ │  journal  │ │  progress  │
//!   │ boxes,    │ │ lifecycle,   │ │ free-text │ │ today view │
//!   │ experim., │ │ completions, │ │ answers   │ │            │
//!   │ tasks,    │ │ day advance  │ │           │ │            │
//!   │ documents │ │              │ │           │ │            │
//!   └─────┬─────┘ └──────┬───────┘ └─────┬─────┘ └──────┬─────┘
//!         └──────────────┴───────┬───────┴──────────────┘
//!                                │
//!                  JSON file per document (storage)
//! ```
//!
//! ## Modules
//!
//! - [`content`]: boxes, experiments, tasks, documents and the publish workflow
//! - [`subscriptions`]: enrollment state machine, completions, legacy import
//! - [`journal`]: append-only answer log and its projection
//! - [`progress`]: the today view
//! - [`settings`]: per-user locale and notification preference
//! - [`auth`]: identity from gateway headers and the admin gate
//! - [`config`]: configuration management

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod journal;
pub mod locale;
pub mod pagination;
pub mod progress;
pub mod settings;
pub mod storage;
pub mod subscriptions;

pub use config::HabitlabConfig;
pub use error::{Error, Result};
