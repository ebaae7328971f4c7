//! Menu Stand
//!
//! Menu viewer and editor for a food stand.
//!
//! This library provides:
//! - The public menu, from a realtime database or the bundled JSON files
//! - Live menu updates over Server-Sent Events
//! - An admin page, gated on a signed-in session, to edit items, the whole
//!   menu and the backend connection
//! - The static carta rendered from the bundled files
//! - Web UI (Dioxus server-side rendering + Pico CSS)

// =============================================================================
// Lints - Enforce code quality and consistency
// =============================================================================

// Deny truly dangerous patterns (these will fail the build)
#![deny(unsafe_code)]
#![deny(unused_must_use)]

// Dioxus page components
pub mod app;

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod loader;
pub mod menu;
pub mod routes;
