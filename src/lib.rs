//! peacnut - image extraction side panel
//!
//! Core of a browser extension side panel that collects images the user picks
//! on web pages. The panel drives an injected page agent in and out of
//! selection mode, keeps the extracted images in a bounded, persisted
//! collection, and offers them for download or drag and drop.
//!
//! Everything that touches the browser sits behind the traits in [`host`],
//! [`store::KeyValueStore`] and [`render::PanelView`]; the WASM build binds
//! them to the extension APIs and the panel DOM.

pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod host;
pub mod logging;
pub mod message;
pub mod model;
pub mod panel;
pub mod protocol;
pub mod render;
pub mod store;
pub mod sync;

pub use panel::Panel;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
