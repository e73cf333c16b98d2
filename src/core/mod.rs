//! Framework-agnostic pieces: recipe resolution, the dual-mode template store,
//! change detection and the live-reload event stream.

pub mod app;
pub mod assets;
pub mod config;
pub mod recipe;
pub mod reload;
pub(crate) mod store;
pub mod watch;
