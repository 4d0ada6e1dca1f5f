//! Host shell for the city-block editor.
//!
//! One tokio task owns the [`editor::Editor`]; HTTP and WebSocket handlers
//! reach it through a cloneable [`editor::EditorHandle`].

pub mod assets;
pub mod config;
pub mod editor;
pub mod event_bus;
pub mod frame;
pub mod http;
