// src/grid/mod.rs
//! Windowed data-grid runtime.
//!
//! `runtime::GridRuntime` is usable on its own from any tokio context; the
//! `plugin` module wires it into a Bevy app.

pub mod cache;
pub mod definitions;
pub mod editing;
pub mod error;
pub mod events;
pub mod fetch;
pub mod history;
pub mod notify;
pub mod plugin;
pub mod resources;
pub mod runtime;
pub mod selection;
pub mod service;
pub mod state;
pub mod store;
pub mod systems;
pub mod virtualizer;

pub use error::{GridError, GridResult, ServiceError};
pub use plugin::{GridPlugin, GridSystemSet};
pub use runtime::{GridRuntime, GridRuntimeBuilder, LoadOutcome, NextPage};
pub use service::{CollectionService, PageResult};
pub use state::GridSnapshot;
