//! Server-rendered page components.

mod admin;
mod carta;
mod home;
mod login;

pub use admin::{AdminPage, PRICE_FIELD_PREFIX};
pub use carta::CartaPage;
pub use home::MenuPage;
pub use login::LoginPage;
