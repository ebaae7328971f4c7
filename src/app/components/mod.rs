//! Shared UI components for the server-rendered pages.

pub mod layout;
pub mod menu;
pub mod nav;

pub use layout::Layout;
pub use menu::{ComboRow, MenuSection, PriceRow};
pub use nav::Nav;
