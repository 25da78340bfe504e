//! # kanban-settings
//!
//! Layered configuration for the task board server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`KanbanSettings::default()`]
//! 2. **Settings file** — `~/.kanban/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables** — `KANBAN_*` overrides (highest priority)
//!
//! Command-line flags are applied by the binary on top of the result.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
