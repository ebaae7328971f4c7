//! Menu data: bundled files and the backend-synchronized tree

pub mod service;
pub mod source;

pub use service::{MenuError, MenuService, MenuSubscription};
pub use source::{BundledMenu, MenuSource, SourceError};
