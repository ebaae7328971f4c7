//! Shared menu data types for the food stand menu service.
//!
//! These types cross the boundary between:
//! - the bundled `data_menu/*.json` files
//! - the realtime backend tree (categories plus `_settings`)
//! - the HTTP API and the rendered pages
//!
//! # Modules
//! - [`category`] - The fixed menu categories
//! - [`item`] - A single menu entry
//! - [`settings`] - Per-category display columns
//! - [`tree`] - The full menu tree and snapshot decoding

pub mod category;
pub mod item;
pub mod settings;
pub mod tree;

// Re-export commonly used types at crate root
pub use category::{Category, UnknownCategory};
pub use item::MenuItem;
pub use settings::{default_settings, CategorySettings, Column, Settings};
pub use tree::{MenuTree, RejectedEntry};
