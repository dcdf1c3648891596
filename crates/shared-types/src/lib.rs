//! Shared types for the site UI crates
//!
//! Event vocabulary and the error type used by both the configuration crate
//! and the WASM bridge.

pub mod errors;
pub mod events;

pub use errors::{SiteUiError, SiteUiResult};
pub use events::{Direction, EventDisposition, EventKind, Key, UiEvent};
